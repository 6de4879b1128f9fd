use super::*;

/// Notifications surfaced by the background reader, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Job(Notify),
    Target(Target),
}
