use crate::automaton::bdd::BddRef;

/// A state of a [super::Dfa].
/// It holds the root of the state's transition diagram, a boolean flag
/// indicating whether the state is accepting, and a boolean flag indicating
/// whether the state is the sink.
///
/// Invariant: A state cannot be both accepting and a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DfaNode {
    pub accepting: bool,
    /// Whether every transition of this non-accepting state loops back to
    /// itself. Set by [super::Dfa::refresh_sink_flags].
    pub sink: bool,
    pub transitions: BddRef,
}

impl DfaNode {
    pub fn new(accepting: bool, sink: bool, transitions: BddRef) -> Self {
        assert!(
            !(accepting && sink),
            "A state cannot be both accepting and a sink"
        );
        DfaNode {
            accepting,
            sink,
            transitions,
        }
    }

    pub fn accepting(transitions: BddRef) -> Self {
        DfaNode::new(true, false, transitions)
    }

    pub fn non_accepting(transitions: BddRef) -> Self {
        DfaNode::new(false, false, transitions)
    }

    pub fn invert(&self) -> Self {
        DfaNode::new(!self.accepting, false, self.transitions)
    }
}
