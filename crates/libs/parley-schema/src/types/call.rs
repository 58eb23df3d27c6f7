use super::common::EngineError;
use crate::wide::Int64;
use crate::{category, shape};

shape! {
    pub struct CallDiscardReasonEmpty = "callDiscardReasonEmpty" {}
}

shape! {
    pub struct CallDiscardReasonMissed = "callDiscardReasonMissed" {}
}

shape! {
    pub struct CallDiscardReasonDeclined = "callDiscardReasonDeclined" {}
}

shape! {
    pub struct CallDiscardReasonDisconnected = "callDiscardReasonDisconnected" {}
}

shape! {
    pub struct CallDiscardReasonHungUp = "callDiscardReasonHungUp" {}
}

category! {
    pub enum CallDiscardReason = "CallDiscardReason" {
        Empty(CallDiscardReasonEmpty),
        Missed(CallDiscardReasonMissed),
        Declined(CallDiscardReasonDeclined),
        Disconnected(CallDiscardReasonDisconnected),
        HungUp(CallDiscardReasonHungUp),
    }
}

shape! {
    pub struct CallStatePending = "callStatePending" {
        is_created: bool,
        is_received: bool,
    }
}

shape! {
    pub struct CallStateExchangingKeys = "callStateExchangingKeys" {}
}

shape! {
    pub struct CallStateReady = "callStateReady" {
        allow_p2p: bool,
        emojis: Vec<String>,
    }
}

shape! {
    pub struct CallStateHangingUp = "callStateHangingUp" {}
}

shape! {
    pub struct CallStateDiscarded = "callStateDiscarded" {
        need_rating: bool,
        need_debug_information: bool,
    }
    variants {
        reason: CallDiscardReason,
    }
}

shape! {
    /// The call failed; `error` is the engine's own error shape.
    pub struct CallStateError = "callStateError" {
        error: EngineError,
    }
}

category! {
    pub enum CallState = "CallState" {
        Pending(CallStatePending),
        ExchangingKeys(CallStateExchangingKeys),
        Ready(CallStateReady),
        HangingUp(CallStateHangingUp),
        Discarded(CallStateDiscarded),
        Error(CallStateError),
    }
}

shape! {
    pub struct Call = "call" {
        id: i32,
        user_id: Int64,
        is_outgoing: bool,
        is_video: bool,
    }
    variants {
        state: CallState,
    }
}
