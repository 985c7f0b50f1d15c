//! The candidate values a [`crate::rule::Rule`] is evaluated against.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Either one IPv4 address or several (a subject with multiple NICs).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Ipv4Field {
    One(Ipv4Addr),
    Many(Vec<Ipv4Addr>),
}

impl Ipv4Field {
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        match self {
            Ipv4Field::One(addr) => std::slice::from_ref(addr).iter().copied(),
            Ipv4Field::Many(addrs) => addrs.iter().copied(),
        }
    }
}

/// A nullary callable a subject exposes under a name, checked by `ExselRule`.
pub type ExselFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// A single fleet member. Every attribute is optional: a missing attribute
/// means "this subject's data for that attribute isn't known here", which
/// `filter` treats as `Uncertain` rather than a non-match.
#[derive(Default, Clone, Deserialize)]
pub struct Subject {
    pub id: Option<String>,
    pub fqdn: Option<String>,
    pub ipv4: Option<Ipv4Field>,
    pub grains: Option<Value>,
    pub pillar: Option<Value>,
    pub data: Option<Value>,
    #[serde(skip)]
    pub functions: Option<HashMap<String, ExselFn>>,
}

impl std::fmt::Debug for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("id", &self.id)
            .field("fqdn", &self.fqdn)
            .field("ipv4", &self.ipv4.as_ref().map(|v| v.iter().collect::<Vec<_>>()))
            .field("grains", &self.grains)
            .field("pillar", &self.pillar)
            .field("data", &self.data)
            .field("functions", &self.functions.as_ref().map(|m| m.keys().collect::<Vec<_>>()))
            .finish()
    }
}

impl Subject {
    pub fn new(id: impl Into<String>) -> Self {
        Subject {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    pub fn with_ipv4(mut self, ipv4: Ipv4Field) -> Self {
        self.ipv4 = Some(ipv4);
        self
    }

    pub fn with_grains(mut self, grains: Value) -> Self {
        self.grains = Some(grains);
        self
    }

    pub fn with_pillar(mut self, pillar: Value) -> Self {
        self.pillar = Some(pillar);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, f: ExselFn) -> Self {
        self.functions.get_or_insert_with(HashMap::new).insert(name.into(), f);
        self
    }
}
