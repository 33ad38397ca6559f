use serde::{Deserialize, Serialize};

use carchain_core::{DomainError, DomainResult, Entity, OrgId, PartKind, ValueObject, Vin};

/// One physical component's supplier claim and serial identifier.
///
/// Empty strings mean "unset"; the serialized form keeps them as `""` so that
/// stored records always carry every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub maker: OrgId,
    pub id: String,
}

impl Part {
    /// A maker has claimed this part.
    pub fn is_claimed(&self) -> bool {
        !self.maker.is_unset()
    }

    /// A serial has been supplied for this part.
    pub fn is_supplied(&self) -> bool {
        !self.id.is_empty()
    }
}

impl ValueObject for Part {}

/// Effective assembly state, derived from which fields are populated.
///
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStage {
    Ordered,
    MakerAssigned,
    PartiallySupplied,
    FullySupplied,
}

/// Persisted provenance of one vehicle: its vin plus the engine and body claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRecord {
    vin: Vin,
    engine: Part,
    body: Part,
}

impl CarRecord {
    /// A freshly ordered car: both parts unclaimed and unsupplied.
    pub fn ordered(vin: Vin) -> Self {
        Self {
            vin,
            engine: Part::default(),
            body: Part::default(),
        }
    }

    pub fn vin(&self) -> &Vin {
        &self.vin
    }

    pub fn engine(&self) -> &Part {
        &self.engine
    }

    pub fn body(&self) -> &Part {
        &self.body
    }

    pub fn stage(&self) -> AssemblyStage {
        match (self.engine.is_supplied(), self.body.is_supplied()) {
            (true, true) => AssemblyStage::FullySupplied,
            (true, false) | (false, true) => AssemblyStage::PartiallySupplied,
            (false, false) if self.engine.is_claimed() => AssemblyStage::MakerAssigned,
            (false, false) => AssemblyStage::Ordered,
        }
    }

    /// Record which organization is to build the engine.
    ///
    /// Only the engine has an assignable maker; the body maker is stamped by
    /// the body supply itself.
    pub fn assign_maker(&mut self, part: PartKind, maker: OrgId) -> DomainResult<()> {
        match part {
            PartKind::Engine => {
                self.engine.maker = maker;
                Ok(())
            }
            PartKind::Body => Err(DomainError::validation(
                "cannot assign a maker to anything but engine",
            )),
        }
    }

    /// Stamp the body with its supplier and serial.
    pub fn supply_body(&mut self, supplier: OrgId, id: impl Into<String>) {
        self.body.maker = supplier;
        self.body.id = id.into();
    }

    /// Set the engine serial. The maker stays as assigned; callers check that
    /// the supplier is that maker before calling.
    pub fn supply_engine(&mut self, id: impl Into<String>) {
        self.engine.id = id.into();
    }

    /// Check the structural invariants of a record read back from storage.
    pub fn check_invariants(&self) -> DomainResult<()> {
        if self.vin.as_str().is_empty() {
            return Err(DomainError::malformed("record has an empty vin"));
        }
        if self.engine.is_supplied() && !self.engine.is_claimed() {
            return Err(DomainError::malformed(format!(
                "car '{}' has an engine serial without a maker",
                self.vin
            )));
        }
        if self.body.is_supplied() != self.body.is_claimed() {
            return Err(DomainError::malformed(format!(
                "car '{}' has a body maker and serial out of step",
                self.vin
            )));
        }
        Ok(())
    }
}

impl Entity for CarRecord {
    type Id = Vin;

    fn id(&self) -> &Self::Id {
        &self.vin
    }
}
