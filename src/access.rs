/// Access-control collaborator
///
/// Administrative operations pass the calling identity here instead of
/// consulting an ambient owner singleton. Implementations resolve who the
/// owner is; the engine only asks whether a caller matches.
use crate::types::Address;

/// Resolves the owner identity for administrative authorization.
pub trait AccessControl: Send + Sync {
    /// The configured owner identity.
    fn owner(&self) -> Address;

    /// Whether `caller` is authorized for administrative operations.
    fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner()
    }
}

/// Single fixed owner, set at construction.
#[derive(Debug, Clone)]
pub struct StaticOwner {
    owner: Address,
}

impl StaticOwner {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }
}

impl AccessControl for StaticOwner {
    fn owner(&self) -> Address {
        self.owner
    }
}
