use crate::{roles::Role, SecurityContext, SecurityError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create, update and soft-delete catalog entries.
    MedicineWrite,
    /// Record a sale against stock.
    SaleComplete,
}

fn allowed_roles(cap: Capability) -> &'static [Role] {
    use Capability::*;
    use Role::*;
    match cap {
        MedicineWrite => &[Admin],
        SaleComplete => &[Admin, Sales],
    }
}

pub fn ensure_capability(ctx: &SecurityContext, cap: Capability) -> Result<(), SecurityError> {
    let allowed = allowed_roles(cap);
    if ctx.roles.iter().any(|r| allowed.iter().any(|a| a == r)) { return Ok(()); }
    tracing::warn!(subject = ?ctx.subject, capability = ?cap, roles = ?ctx.roles, "capability_denied");
    Err(SecurityError::Forbidden)
}
