//! Declarative table of the CRUD entities exposed by the API.

use serde_json::{Map, Value};

/// An opaque stored record (`id`, `created_at` and the writable fields).
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Campaigns,
    Events,
}

/// Everything the generic CRUD path needs to know about one entity.
#[derive(Debug)]
pub struct EntitySpec {
    pub entity: Entity,
    /// Path segment under `/api`, also the table name.
    pub table: &'static str,
    /// Singular noun used in response messages.
    pub noun: &'static str,
    /// Past-tense verb for the create message ("created", "tracked").
    pub created_verb: &'static str,
    /// Columns a client may write. Anything else in a body is ignored.
    pub fields: &'static [&'static str],
    /// Whether `PUT` and `DELETE` are routed.
    pub mutable: bool,
}

pub static CAMPAIGNS: EntitySpec = EntitySpec {
    entity: Entity::Campaigns,
    table: "campaigns",
    noun: "Campaign",
    created_verb: "created",
    fields: &["name", "description", "startDate", "endDate"],
    mutable: true,
};

pub static EVENTS: EntitySpec = EntitySpec {
    entity: Entity::Events,
    table: "events",
    noun: "Event",
    created_verb: "tracked",
    fields: &["type", "campaignId", "userId"],
    mutable: false,
};

pub static ENTITIES: &[&EntitySpec] = &[&CAMPAIGNS, &EVENTS];

/// Column on `events` that links an event to its campaign.
pub const EVENT_CAMPAIGN_COLUMN: &str = "campaignId";

impl Entity {
    pub fn spec(self) -> &'static EntitySpec {
        match self {
            Self::Campaigns => &CAMPAIGNS,
            Self::Events => &EVENTS,
        }
    }

    pub fn table(self) -> &'static str {
        self.spec().table
    }
}

impl EntitySpec {
    /// Keep only the writable fields of `body`.
    pub fn writable(&self, body: &Record) -> Record {
        self.fields
            .iter()
            .filter_map(|f| body.get(*f).map(|v| (f.to_string(), v.clone())))
            .collect()
    }

    /// Like [`writable`](Self::writable) but absent fields are written as `null`.
    ///
    /// Used on create so every declared column is set.
    pub fn writable_with_nulls(&self, body: &Record) -> Record {
        self.fields
            .iter()
            .map(|f| (f.to_string(), body.get(*f).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    pub fn message(&self, verb: &str) -> String {
        format!("{} {} successfully", self.noun, verb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        match v {
            Value::Object(m) => m,
            _ => Record::new(),
        }
    }

    #[test]
    fn writable_drops_unknown_fields() {
        let body = record(json!({"name": "Spring", "id": "forged", "budget": 10}));
        let kept = CAMPAIGNS.writable(&body);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept["name"], json!("Spring"));
    }

    #[test]
    fn writable_with_nulls_fills_every_field() {
        let body = record(json!({"type": "click"}));
        let kept = EVENTS.writable_with_nulls(&body);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept["type"], json!("click"));
        assert!(kept["campaignId"].is_null());
        assert!(kept["userId"].is_null());
    }

    #[test]
    fn messages_match_entity() {
        assert_eq!(CAMPAIGNS.message(CAMPAIGNS.created_verb), "Campaign created successfully");
        assert_eq!(EVENTS.message(EVENTS.created_verb), "Event tracked successfully");
        assert_eq!(CAMPAIGNS.message("deleted"), "Campaign deleted successfully");
    }

    #[test]
    fn every_entity_resolves_to_its_spec() {
        for spec in ENTITIES {
            assert_eq!(spec.entity.spec().table, spec.table);
        }
        assert_eq!(Entity::Events.table(), "events");
    }
}
