use crate::{category, shape};

shape! {
    pub struct ConnectionStateWaitingForNetwork = "connectionStateWaitingForNetwork" {}
}

shape! {
    pub struct ConnectionStateConnectingToProxy = "connectionStateConnectingToProxy" {}
}

shape! {
    pub struct ConnectionStateConnecting = "connectionStateConnecting" {}
}

shape! {
    pub struct ConnectionStateUpdating = "connectionStateUpdating" {}
}

shape! {
    pub struct ConnectionStateReady = "connectionStateReady" {}
}

category! {
    /// The engine's view of its own network connectivity.
    pub enum ConnectionState = "ConnectionState" {
        WaitingForNetwork(ConnectionStateWaitingForNetwork),
        ConnectingToProxy(ConnectionStateConnectingToProxy),
        Connecting(ConnectionStateConnecting),
        Updating(ConnectionStateUpdating),
        Ready(ConnectionStateReady),
    }
}
