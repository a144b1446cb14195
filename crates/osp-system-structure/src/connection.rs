//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! The four connection kinds and the aggregate that groups them per kind.
//!
//! Pair connections hold their two endpoints in a fixed-size array, so the
//! arity rule is checked once when a list of endpoints is turned into one.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::endpoint::{OspSignalEndpoint, OspVariableEndpoint};
use crate::errors::{ModelError, Result};
use crate::{wire, DictXml, XmlDict};

const VARIABLE_KEY: &str = "Variable";
const SIGNAL_KEY: &str = "Signal";
const VARIABLE_GROUP_KEY: &str = "VariableGroup";
const SIGNAL_GROUP_KEY: &str = "SignalGroup";

const PAIR: usize = 2;

fn endpoint_pair(
    entity: &'static str,
    field: &'static str,
    endpoints: Option<Vec<OspVariableEndpoint>>,
) -> Result<[OspVariableEndpoint; PAIR]> {
    let endpoints = endpoints.ok_or(ModelError::MissingField { entity, field })?;
    let found = endpoints.len();
    endpoints.try_into().map_err(|_| ModelError::EndpointCount {
        entity,
        expected: PAIR,
        found,
    })
}

fn endpoint_pair_from_dict(
    dict: &XmlDict,
    entity: &'static str,
    field: &'static str,
    key: &str,
) -> Result<[OspVariableEndpoint; PAIR]> {
    let endpoints = wire::list(dict, entity, key)?
        .into_iter()
        .map(OspVariableEndpoint::from_dict_xml)
        .collect::<Result<Vec<_>>>()?;
    endpoint_pair(entity, field, Some(endpoints))
}

fn endpoint_pair_value(endpoints: &[OspVariableEndpoint; PAIR]) -> Value {
    wire::list_value(endpoints.iter().map(|endpoint| endpoint.to_dict_xml()))
}

/// Variable to variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspVariableConnection {
    pub variables: [OspVariableEndpoint; PAIR],
}

impl OspVariableConnection {
    pub fn new(first: OspVariableEndpoint, second: OspVariableEndpoint) -> Self {
        Self {
            variables: [first, second],
        }
    }

    /// Fails with [`ModelError::EndpointCount`] unless exactly two endpoints are given.
    pub fn from_endpoints(endpoints: Vec<OspVariableEndpoint>) -> Result<Self> {
        Ok(Self {
            variables: endpoint_pair(Self::ENTITY, "variables", Some(endpoints))?,
        })
    }

    pub fn builder() -> OspVariableConnectionBuilder {
        OspVariableConnectionBuilder::default()
    }
}

impl DictXml for OspVariableConnection {
    const ENTITY: &'static str = "OspVariableConnection";
    const REQUIRED_FIELDS: &'static [&'static str] = &["variables"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            variables: endpoint_pair_from_dict(dict, Self::ENTITY, "variables", VARIABLE_KEY)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(VARIABLE_KEY.to_owned(), endpoint_pair_value(&self.variables));
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspVariableConnectionBuilder {
    variables: Option<Vec<OspVariableEndpoint>>,
}

impl OspVariableConnectionBuilder {
    pub fn variable(mut self, endpoint: OspVariableEndpoint) -> Self {
        self.variables.get_or_insert_with(Vec::new).push(endpoint);
        self
    }

    pub fn build(self) -> Result<OspVariableConnection> {
        Ok(OspVariableConnection {
            variables: endpoint_pair(OspVariableConnection::ENTITY, "variables", self.variables)?,
        })
    }
}

/// Variable to function signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspSignalConnection {
    pub variable: OspVariableEndpoint,
    pub signal: OspSignalEndpoint,
}

impl OspSignalConnection {
    pub fn new(variable: OspVariableEndpoint, signal: OspSignalEndpoint) -> Self {
        Self { variable, signal }
    }

    pub fn builder() -> OspSignalConnectionBuilder {
        OspSignalConnectionBuilder::default()
    }
}

impl DictXml for OspSignalConnection {
    const ENTITY: &'static str = "OspSignalConnection";
    const REQUIRED_FIELDS: &'static [&'static str] = &["variable", "signal"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            variable: OspVariableEndpoint::from_dict_xml(wire::object(
                dict,
                Self::ENTITY,
                VARIABLE_KEY,
            )?)?,
            signal: OspSignalEndpoint::from_dict_xml(wire::object(dict, Self::ENTITY, SIGNAL_KEY)?)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(
            VARIABLE_KEY.to_owned(),
            Value::Object(self.variable.to_dict_xml()),
        );
        dict.insert(SIGNAL_KEY.to_owned(), Value::Object(self.signal.to_dict_xml()));
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspSignalConnectionBuilder {
    variable: Option<OspVariableEndpoint>,
    signal: Option<OspSignalEndpoint>,
}

impl OspSignalConnectionBuilder {
    pub fn variable(mut self, endpoint: OspVariableEndpoint) -> Self {
        self.variable = Some(endpoint);
        self
    }

    pub fn signal(mut self, endpoint: OspSignalEndpoint) -> Self {
        self.signal = Some(endpoint);
        self
    }

    pub fn build(self) -> Result<OspSignalConnection> {
        const ENTITY: &str = OspSignalConnection::ENTITY;
        Ok(OspSignalConnection {
            variable: self.variable.ok_or(ModelError::MissingField {
                entity: ENTITY,
                field: "variable",
            })?,
            signal: self.signal.ok_or(ModelError::MissingField {
                entity: ENTITY,
                field: "signal",
            })?,
        })
    }
}

/// Variable group to variable group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspVariableGroupConnection {
    pub variable_groups: [OspVariableEndpoint; PAIR],
}

impl OspVariableGroupConnection {
    pub fn new(first: OspVariableEndpoint, second: OspVariableEndpoint) -> Self {
        Self {
            variable_groups: [first, second],
        }
    }

    pub fn from_endpoints(endpoints: Vec<OspVariableEndpoint>) -> Result<Self> {
        Ok(Self {
            variable_groups: endpoint_pair(Self::ENTITY, "variable_groups", Some(endpoints))?,
        })
    }

    pub fn builder() -> OspVariableGroupConnectionBuilder {
        OspVariableGroupConnectionBuilder::default()
    }
}

impl DictXml for OspVariableGroupConnection {
    const ENTITY: &'static str = "OspVariableGroupConnection";
    const REQUIRED_FIELDS: &'static [&'static str] = &["variable_groups"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            variable_groups: endpoint_pair_from_dict(
                dict,
                Self::ENTITY,
                "variable_groups",
                VARIABLE_GROUP_KEY,
            )?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(
            VARIABLE_GROUP_KEY.to_owned(),
            endpoint_pair_value(&self.variable_groups),
        );
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspVariableGroupConnectionBuilder {
    variable_groups: Option<Vec<OspVariableEndpoint>>,
}

impl OspVariableGroupConnectionBuilder {
    pub fn variable_group(mut self, endpoint: OspVariableEndpoint) -> Self {
        self.variable_groups
            .get_or_insert_with(Vec::new)
            .push(endpoint);
        self
    }

    pub fn build(self) -> Result<OspVariableGroupConnection> {
        Ok(OspVariableGroupConnection {
            variable_groups: endpoint_pair(
                OspVariableGroupConnection::ENTITY,
                "variable_groups",
                self.variable_groups,
            )?,
        })
    }
}

/// Signal group to variable group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspSignalGroupConnection {
    pub signal_group: OspSignalEndpoint,
    pub variable_group: OspVariableEndpoint,
}

impl OspSignalGroupConnection {
    pub fn new(signal_group: OspSignalEndpoint, variable_group: OspVariableEndpoint) -> Self {
        Self {
            signal_group,
            variable_group,
        }
    }

    pub fn builder() -> OspSignalGroupConnectionBuilder {
        OspSignalGroupConnectionBuilder::default()
    }
}

impl DictXml for OspSignalGroupConnection {
    const ENTITY: &'static str = "OspSignalGroupConnection";
    const REQUIRED_FIELDS: &'static [&'static str] = &["signal_group", "variable_group"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            signal_group: OspSignalEndpoint::from_dict_xml(wire::object(
                dict,
                Self::ENTITY,
                SIGNAL_GROUP_KEY,
            )?)?,
            variable_group: OspVariableEndpoint::from_dict_xml(wire::object(
                dict,
                Self::ENTITY,
                VARIABLE_GROUP_KEY,
            )?)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(
            SIGNAL_GROUP_KEY.to_owned(),
            Value::Object(self.signal_group.to_dict_xml()),
        );
        dict.insert(
            VARIABLE_GROUP_KEY.to_owned(),
            Value::Object(self.variable_group.to_dict_xml()),
        );
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspSignalGroupConnectionBuilder {
    signal_group: Option<OspSignalEndpoint>,
    variable_group: Option<OspVariableEndpoint>,
}

impl OspSignalGroupConnectionBuilder {
    pub fn signal_group(mut self, endpoint: OspSignalEndpoint) -> Self {
        self.signal_group = Some(endpoint);
        self
    }

    pub fn variable_group(mut self, endpoint: OspVariableEndpoint) -> Self {
        self.variable_group = Some(endpoint);
        self
    }

    pub fn build(self) -> Result<OspSignalGroupConnection> {
        const ENTITY: &str = OspSignalGroupConnection::ENTITY;
        Ok(OspSignalGroupConnection {
            signal_group: self.signal_group.ok_or(ModelError::MissingField {
                entity: ENTITY,
                field: "signal_group",
            })?,
            variable_group: self.variable_group.ok_or(ModelError::MissingField {
                entity: ENTITY,
                field: "variable_group",
            })?,
        })
    }
}

/// Connection kinds, named after their wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    Variable,
    Signal,
    VariableGroup,
    SignalGroup,
}

impl ConnectionKind {
    /// Wire order of the kinds inside `Connections`.
    pub const ALL: [ConnectionKind; 4] = [
        ConnectionKind::Variable,
        ConnectionKind::Signal,
        ConnectionKind::VariableGroup,
        ConnectionKind::SignalGroup,
    ];

    pub const fn kind_name(self) -> &'static str {
        match self {
            ConnectionKind::Variable => "VariableConnection",
            ConnectionKind::Signal => "SignalConnection",
            ConnectionKind::VariableGroup => "VariableGroupConnection",
            ConnectionKind::SignalGroup => "SignalGroupConnection",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

impl FromStr for ConnectionKind {
    type Err = ModelError;

    fn from_str(tag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.kind_name() == tag)
            .ok_or_else(|| ModelError::UnsupportedVariant {
                family: "connection",
                tag: tag.to_owned(),
            })
    }
}

/// Any one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OspConnection {
    Variable(OspVariableConnection),
    Signal(OspSignalConnection),
    VariableGroup(OspVariableGroupConnection),
    SignalGroup(OspSignalGroupConnection),
}

impl OspConnection {
    pub fn kind(&self) -> ConnectionKind {
        match self {
            OspConnection::Variable(_) => ConnectionKind::Variable,
            OspConnection::Signal(_) => ConnectionKind::Signal,
            OspConnection::VariableGroup(_) => ConnectionKind::VariableGroup,
            OspConnection::SignalGroup(_) => ConnectionKind::SignalGroup,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().kind_name()
    }

    pub fn from_dict_xml(kind: ConnectionKind, dict: &XmlDict) -> Result<Self> {
        let connection: OspConnection = match kind {
            ConnectionKind::Variable => OspVariableConnection::from_dict_xml(dict)?.into(),
            ConnectionKind::Signal => OspSignalConnection::from_dict_xml(dict)?.into(),
            ConnectionKind::VariableGroup => OspVariableGroupConnection::from_dict_xml(dict)?.into(),
            ConnectionKind::SignalGroup => OspSignalGroupConnection::from_dict_xml(dict)?.into(),
        };
        Ok(connection)
    }

    pub fn to_dict_xml(&self) -> XmlDict {
        match self {
            OspConnection::Variable(connection) => connection.to_dict_xml(),
            OspConnection::Signal(connection) => connection.to_dict_xml(),
            OspConnection::VariableGroup(connection) => connection.to_dict_xml(),
            OspConnection::SignalGroup(connection) => connection.to_dict_xml(),
        }
    }
}

impl From<OspVariableConnection> for OspConnection {
    fn from(connection: OspVariableConnection) -> Self {
        OspConnection::Variable(connection)
    }
}

impl From<OspSignalConnection> for OspConnection {
    fn from(connection: OspSignalConnection) -> Self {
        OspConnection::Signal(connection)
    }
}

impl From<OspVariableGroupConnection> for OspConnection {
    fn from(connection: OspVariableGroupConnection) -> Self {
        OspConnection::VariableGroup(connection)
    }
}

impl From<OspSignalGroupConnection> for OspConnection {
    fn from(connection: OspSignalGroupConnection) -> Self {
        OspConnection::SignalGroup(connection)
    }
}

/// Connections of a system, one list per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OspConnections {
    pub variable_connections: Vec<OspVariableConnection>,
    pub signal_connections: Vec<OspSignalConnection>,
    pub variable_group_connections: Vec<OspVariableGroupConnection>,
    pub signal_group_connections: Vec<OspSignalGroupConnection>,
}

impl OspConnections {
    pub const ENTITY: &'static str = "OspConnections";

    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the list matching the connection's kind.
    pub fn add_connection(&mut self, connection: impl Into<OspConnection>) {
        match connection.into() {
            OspConnection::Variable(c) => self.variable_connections.push(c),
            OspConnection::Signal(c) => self.signal_connections.push(c),
            OspConnection::VariableGroup(c) => self.variable_group_connections.push(c),
            OspConnection::SignalGroup(c) => self.signal_group_connections.push(c),
        }
    }

    pub fn count(&self, kind: ConnectionKind) -> usize {
        match kind {
            ConnectionKind::Variable => self.variable_connections.len(),
            ConnectionKind::Signal => self.signal_connections.len(),
            ConnectionKind::VariableGroup => self.variable_group_connections.len(),
            ConnectionKind::SignalGroup => self.signal_group_connections.len(),
        }
    }

    pub fn len(&self) -> usize {
        ConnectionKind::ALL.into_iter().map(|kind| self.count(kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every connection, grouped by kind in wire order.
    pub fn iter(&self) -> impl Iterator<Item = OspConnection> + '_ {
        let variable = self.variable_connections.iter().cloned().map(OspConnection::from);
        let signal = self.signal_connections.iter().cloned().map(OspConnection::from);
        let variable_group = self
            .variable_group_connections
            .iter()
            .cloned()
            .map(OspConnection::from);
        let signal_group = self
            .signal_group_connections
            .iter()
            .cloned()
            .map(OspConnection::from);
        variable.chain(signal).chain(variable_group).chain(signal_group)
    }

    pub fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        let mut connections = Self::new();
        for kind in ConnectionKind::ALL {
            for item in wire::list(dict, Self::ENTITY, kind.kind_name())? {
                connections.add_connection(OspConnection::from_dict_xml(kind, item)?);
            }
        }
        Ok(connections)
    }

    /// `None` when there are no connections at all; empty kinds are left out.
    pub fn to_dict_xml(&self) -> Option<XmlDict> {
        if self.is_empty() {
            return None;
        }
        let mut dict = XmlDict::new();
        let mut insert = |kind: ConnectionKind, items: Vec<XmlDict>| {
            if !items.is_empty() {
                dict.insert(kind.kind_name().to_owned(), wire::list_value(items));
            }
        };
        insert(
            ConnectionKind::Variable,
            self.variable_connections.iter().map(DictXml::to_dict_xml).collect(),
        );
        insert(
            ConnectionKind::Signal,
            self.signal_connections.iter().map(DictXml::to_dict_xml).collect(),
        );
        insert(
            ConnectionKind::VariableGroup,
            self.variable_group_connections
                .iter()
                .map(DictXml::to_dict_xml)
                .collect(),
        );
        insert(
            ConnectionKind::SignalGroup,
            self.signal_group_connections
                .iter()
                .map(DictXml::to_dict_xml)
                .collect(),
        );
        Some(dict)
    }
}
