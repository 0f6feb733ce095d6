use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Limits embedded in a ticket.
///
/// Immutable once embedded: the builder methods consume `self` and return a
/// new value. An empty `allowed_servers` set means no downstream server is
/// reachable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConstraintsWire")]
pub struct AuditConstraints {
    max_op_value: f64,
    #[serde(rename = "allowed_mcp_servers")]
    allowed_servers: BTreeSet<String>,
    kill_switch_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_ops_per_hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geo_restrictions: Option<BTreeSet<String>>,
}

/// Unchecked wire shape; converted through `TryFrom` so decoded tickets
/// obey the same invariants as constructed ones.
#[derive(Deserialize)]
struct ConstraintsWire {
    max_op_value: f64,
    #[serde(rename = "allowed_mcp_servers", default)]
    allowed_servers: BTreeSet<String>,
    #[serde(default)]
    kill_switch_active: bool,
    #[serde(default)]
    max_ops_per_hour: Option<u32>,
    #[serde(default)]
    geo_restrictions: Option<BTreeSet<String>>,
}

impl TryFrom<ConstraintsWire> for AuditConstraints {
    type Error = TypeError;

    fn try_from(wire: ConstraintsWire) -> Result<Self, Self::Error> {
        let mut constraints = AuditConstraints::new(wire.max_op_value, wire.allowed_servers)?
            .with_kill_switch(wire.kill_switch_active);
        constraints.max_ops_per_hour = wire.max_ops_per_hour;
        constraints.geo_restrictions = wire.geo_restrictions;
        Ok(constraints)
    }
}

impl AuditConstraints {
    /// Create a constraint set with the kill switch off.
    pub fn new<I, S>(max_op_value: f64, allowed_servers: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !max_op_value.is_finite() || max_op_value <= 0.0 {
            return Err(TypeError::InvalidOpValue(max_op_value));
        }

        Ok(Self {
            max_op_value,
            allowed_servers: allowed_servers.into_iter().map(Into::into).collect(),
            kill_switch_active: false,
            max_ops_per_hour: None,
            geo_restrictions: None,
        })
    }

    pub fn with_kill_switch(mut self, active: bool) -> Self {
        self.kill_switch_active = active;
        self
    }

    pub fn with_max_ops_per_hour(mut self, max_ops: u32) -> Self {
        self.max_ops_per_hour = Some(max_ops);
        self
    }

    pub fn with_geo_restrictions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.geo_restrictions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_op_value(&self) -> f64 {
        self.max_op_value
    }

    pub fn allowed_servers(&self) -> &BTreeSet<String> {
        &self.allowed_servers
    }

    /// Whitelist membership; never true for an empty whitelist.
    pub fn allows_server(&self, server: &str) -> bool {
        self.allowed_servers.contains(server)
    }

    pub fn kill_switch_active(&self) -> bool {
        self.kill_switch_active
    }

    pub fn max_ops_per_hour(&self) -> Option<u32> {
        self.max_ops_per_hour
    }

    pub fn geo_restrictions(&self) -> Option<&BTreeSet<String>> {
        self.geo_restrictions.as_ref()
    }
}
