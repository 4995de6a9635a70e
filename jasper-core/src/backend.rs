/// An opaque handle to a value owned by the code-generation backend.
///
/// The runtime never inspects these; it only carries them through evaluation
/// and hands them back when the backend consumes the finished global scope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct BackendRef(pub u32);
