use super::*;

/// What the connection actor broadcasts to the mining side. Responses
/// never appear here since they are routed back to their callers by id.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new unit of work; the controller preempts the in-flight search
    /// and republishes the job to every worker.
    Notify(Notify),
    /// Recorded and logged; the share target stays nbits-derived.
    SetDifficulty(Difficulty),
    /// The socket is gone. Fatal for the session, there is no reconnect.
    Disconnected,
}
