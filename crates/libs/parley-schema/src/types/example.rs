use crate::shape;
use crate::wide::Int64;

shape! {
    /// Reply to `example.echo`.
    pub struct EchoResult = "example.echoResult" {
        value: String,
    }
}

shape! {
    /// Periodic push event emitted by the engine's self-test surface.
    pub struct Tick = "example.event.tick" {
        count: Int64,
    }
}
