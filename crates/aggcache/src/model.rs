use crate::predicate::Predicate;

///
/// AssociationModel
///
/// One belongs-to relation declared on a child entity: the association name,
/// the parent entity it targets, the foreign-key field on the child, and the
/// default filter conditions used when a rule specifies none.
///

#[derive(Clone, Debug, PartialEq)]
pub struct AssociationModel {
    pub name: String,
    pub target_entity: String,
    pub foreign_key: String,
    pub conditions: Predicate,
}

impl AssociationModel {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_entity: target_entity.into(),
            foreign_key: foreign_key.into(),
            conditions: Predicate::True,
        }
    }

    /// Attach default conditions inherited by rules that declare none.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Predicate) -> Self {
        self.conditions = conditions;
        self
    }
}

///
/// EntityModel
///
/// Runtime schema metadata the synchronizer consumes from the host: entity
/// name, primary-key field, and declared belongs-to associations.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EntityModel {
    pub entity_name: String,
    pub primary_key: String,
    pub associations: Vec<AssociationModel>,
}

impl EntityModel {
    #[must_use]
    pub fn new(entity_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            primary_key: primary_key.into(),
            associations: Vec::new(),
        }
    }

    #[must_use]
    pub fn belongs_to(mut self, association: AssociationModel) -> Self {
        self.associations.push(association);
        self
    }

    /// Resolve one declared association by name.
    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationModel> {
        self.associations
            .iter()
            .find(|association| association.name == name)
    }
}

///
/// TESTS
///
