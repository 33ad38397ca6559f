use carchain_core::OrgId;

use crate::identity::IdentityError;

/// Canonicalize an issuer organization: keep everything before the first `.`.
///
/// `"rr.example.com"` resolves to `"rr"`. An empty result is an error, never
/// an accepted (and therefore permissive) organization.
pub fn canonical_organization(raw: &str) -> Result<OrgId, IdentityError> {
    let head = raw.split('.').next().unwrap_or_default();
    if head.is_empty() {
        return Err(IdentityError::EmptyOrganization(raw.to_string()));
    }
    Ok(OrgId::new(head))
}
