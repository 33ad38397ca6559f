use thiserror::Error;

use carchain_core::{Operation, OrgId, PartKind};

use crate::identity::IdentityError;
use crate::policy::{AccessPolicy, OrgRule};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The caller's organization does not satisfy the rule.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request names a combination the table has no row for.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The caller's organization could not be resolved.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] IdentityError),
}

/// A single authorization question, asked before the record is loaded.
///
/// `caller` is `None` when the operation's rule did not require resolving the
/// caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest<'a> {
    pub operation: Operation,
    pub part: Option<PartKind>,
    pub caller: Option<&'a OrgId>,
}

impl AccessPolicy {
    /// Whether the caller's identity must be resolved before `operation` runs.
    pub fn requires_identity(&self, operation: Operation) -> bool {
        match operation {
            Operation::Create => self.create.requires_identity(),
            Operation::Query => self.query.requires_identity(),
            Operation::AssignMaker => self.assign_maker.callers.requires_identity(),
            Operation::Supply => true,
        }
    }

    /// Authorize an operation against the table.
    ///
    /// - No IO
    /// - No panics
    /// - Every denial carries the violated rule
    pub fn authorize(&self, request: &AccessRequest<'_>) -> Result<(), AuthzError> {
        match request.operation {
            Operation::Create => check_rule(&self.create, request),
            Operation::Query => check_rule(&self.query, request),
            Operation::AssignMaker => {
                check_rule(&self.assign_maker.callers, request)?;
                let part = require_part(request)?;
                if !self.assign_maker.assignable_parts.contains(&part) {
                    return Err(AuthzError::InvalidRequest(format!(
                        "cannot assign a maker to '{part}'"
                    )));
                }
                Ok(())
            }
            Operation::Supply => {
                let caller = require_caller(request)?;
                match require_part(request)? {
                    PartKind::Body if caller == &self.supply.body_supplier => Ok(()),
                    PartKind::Body => Err(AuthzError::Unauthorized(format!(
                        "only '{}' may supply body, caller is '{caller}'",
                        self.supply.body_supplier
                    ))),
                    PartKind::Engine if self.supply.engine_suppliers.allows(caller) => Ok(()),
                    PartKind::Engine => Err(AuthzError::Unauthorized(format!(
                        "only {} may supply engine, caller is '{caller}'",
                        self.supply.engine_suppliers.describe()
                    ))),
                }
            }
        }
    }

    /// Second half of the engine supply rule, evaluated against the loaded
    /// record: the caller must be the engine's assigned maker.
    pub fn authorize_engine_claim(
        &self,
        caller: &OrgId,
        engine_maker: &OrgId,
    ) -> Result<(), AuthzError> {
        if engine_maker.is_unset() {
            return Err(AuthzError::Unauthorized(
                "engine maker has not been assigned yet".to_string(),
            ));
        }
        if engine_maker != caller {
            return Err(AuthzError::Unauthorized(format!(
                "engine is assigned to '{engine_maker}', caller is '{caller}'"
            )));
        }
        Ok(())
    }
}

fn check_rule(rule: &OrgRule, request: &AccessRequest<'_>) -> Result<(), AuthzError> {
    if !rule.requires_identity() {
        return Ok(());
    }
    let caller = require_caller(request)?;
    if rule.allows(caller) {
        Ok(())
    } else {
        Err(AuthzError::Unauthorized(format!(
            "only {} authorized to call {}, caller is '{caller}'",
            rule.describe(),
            request.operation
        )))
    }
}

fn require_caller<'a>(request: &AccessRequest<'a>) -> Result<&'a OrgId, AuthzError> {
    request.caller.ok_or_else(|| {
        AuthzError::Unauthorized(format!(
            "{} requires an authenticated organization",
            request.operation
        ))
    })
}

fn require_part(request: &AccessRequest<'_>) -> Result<PartKind, AuthzError> {
    request.part.ok_or_else(|| {
        AuthzError::InvalidRequest(format!("{} requires a part", request.operation))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(name: &str) -> OrgId {
        OrgId::from(name)
    }

    fn request<'a>(
        operation: Operation,
        part: Option<PartKind>,
        caller: Option<&'a OrgId>,
    ) -> AccessRequest<'a> {
        AccessRequest {
            operation,
            part,
            caller,
        }
    }

    #[test]
    fn create_and_query_need_no_identity() {
        let policy = AccessPolicy::default();
        assert!(!policy.requires_identity(Operation::Create));
        assert!(!policy.requires_identity(Operation::Query));
        assert!(policy.authorize(&request(Operation::Create, None, None)).is_ok());
        assert!(policy.authorize(&request(Operation::Query, None, None)).is_ok());
    }

    #[test]
    fn only_factory_assigns_makers() {
        let policy = AccessPolicy::default();
        let factory = org("factory");
        let gm = org("gm");

        assert!(policy
            .authorize(&request(Operation::AssignMaker, Some(PartKind::Engine), Some(&factory)))
            .is_ok());

        let err = policy
            .authorize(&request(Operation::AssignMaker, Some(PartKind::Engine), Some(&gm)))
            .unwrap_err();
        match err {
            AuthzError::Unauthorized(msg) => {
                assert!(msg.contains("{factory}"));
                assert!(msg.contains("assignMaker"));
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn body_maker_assignment_is_an_invalid_request() {
        let policy = AccessPolicy::default();
        let factory = org("factory");
        let err = policy
            .authorize(&request(Operation::AssignMaker, Some(PartKind::Body), Some(&factory)))
            .unwrap_err();
        assert!(matches!(err, AuthzError::InvalidRequest(_)));
    }

    #[test]
    fn unresolved_caller_is_never_allowed_to_mutate() {
        let policy = AccessPolicy::default();
        for (op, part) in [
            (Operation::AssignMaker, PartKind::Engine),
            (Operation::Supply, PartKind::Body),
            (Operation::Supply, PartKind::Engine),
        ] {
            let err = policy.authorize(&request(op, Some(part), None)).unwrap_err();
            assert!(matches!(err, AuthzError::Unauthorized(_)), "{op} {part}");
        }
    }

    #[test]
    fn body_supply_is_reserved_for_the_body_supplier() {
        let policy = AccessPolicy::default();
        let gm = org("gm");
        let rr = org("rr");
        assert!(policy
            .authorize(&request(Operation::Supply, Some(PartKind::Body), Some(&gm)))
            .is_ok());
        let err = policy
            .authorize(&request(Operation::Supply, Some(PartKind::Body), Some(&rr)))
            .unwrap_err();
        assert!(matches!(err, AuthzError::Unauthorized(msg) if msg.contains("only 'gm'")));
    }

    #[test]
    fn engine_supply_requires_supplier_set_and_claim() {
        let policy = AccessPolicy::default();
        let ferrari = org("ferrari");
        let factory = org("factory");

        assert!(policy
            .authorize(&request(Operation::Supply, Some(PartKind::Engine), Some(&ferrari)))
            .is_ok());
        assert!(policy
            .authorize(&request(Operation::Supply, Some(PartKind::Engine), Some(&factory)))
            .is_err());

        assert!(policy.authorize_engine_claim(&ferrari, &org("ferrari")).is_ok());
        let err = policy.authorize_engine_claim(&ferrari, &org("rr")).unwrap_err();
        assert!(matches!(err, AuthzError::Unauthorized(msg) if msg.contains("assigned to 'rr'")));
        assert!(policy.authorize_engine_claim(&ferrari, &OrgId::default()).is_err());
    }

    #[test]
    fn reconfigured_table_changes_decisions() {
        let policy = AccessPolicy::from_json(
            r#"{ "create": { "one_of": ["factory"] } }"#,
        )
        .unwrap();
        let gm = org("gm");
        assert!(policy.requires_identity(Operation::Create));
        assert!(policy.authorize(&request(Operation::Create, None, Some(&gm))).is_err());
        assert!(policy.authorize(&request(Operation::Create, None, None)).is_err());
    }

    #[test]
    fn open_assign_maker_needs_no_identity() {
        let policy = AccessPolicy::from_json(
            r#"{ "assign_maker": { "callers": "any", "assignable_parts": ["engine"] } }"#,
        )
        .unwrap();
        assert!(!policy.requires_identity(Operation::AssignMaker));
        assert!(policy.requires_identity(Operation::Supply));
        assert!(policy
            .authorize(&request(Operation::AssignMaker, Some(PartKind::Engine), None))
            .is_ok());

        let err = policy
            .authorize(&request(Operation::AssignMaker, Some(PartKind::Body), None))
            .unwrap_err();
        assert!(matches!(err, AuthzError::InvalidRequest(_)));
        assert!(AccessPolicy::default().requires_identity(Operation::AssignMaker));
    }
}
