//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use osp_xml::double_value;
use serde_json::Value;

use crate::errors::{ModelError, Result};
use crate::{required_identifier, wire, DictXml, XmlDict};

const NAME_KEY: &str = "@name";
const FACTOR_KEY: &str = "@factor";
const OFFSET_KEY: &str = "@offset";
const INPUT_COUNT_KEY: &str = "@inputCount";
const DIMENSION_KEY: &str = "@dimension";

fn missing(entity: &'static str, field: &'static str) -> ModelError {
    ModelError::MissingField { entity, field }
}

/// `y = factor * u + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct OspLinearTransformationFunction {
    pub name: String,
    pub factor: f64,
    pub offset: f64,
}

impl OspLinearTransformationFunction {
    pub fn new(name: impl Into<String>, factor: f64, offset: f64) -> Self {
        Self {
            name: name.into(),
            factor,
            offset,
        }
    }

    pub fn builder() -> OspLinearTransformationFunctionBuilder {
        OspLinearTransformationFunctionBuilder::default()
    }
}

impl DictXml for OspLinearTransformationFunction {
    const ENTITY: &'static str = "OspLinearTransformationFunction";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "factor", "offset"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            name: wire::string(dict, Self::ENTITY, NAME_KEY)?,
            factor: wire::float(dict, Self::ENTITY, FACTOR_KEY)?,
            offset: wire::float(dict, Self::ENTITY, OFFSET_KEY)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(NAME_KEY.to_owned(), Value::from(self.name.as_str()));
        dict.insert(FACTOR_KEY.to_owned(), double_value(self.factor));
        dict.insert(OFFSET_KEY.to_owned(), double_value(self.offset));
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspLinearTransformationFunctionBuilder {
    name: Option<String>,
    factor: Option<f64>,
    offset: Option<f64>,
}

impl OspLinearTransformationFunctionBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn build(self) -> Result<OspLinearTransformationFunction> {
        const ENTITY: &str = OspLinearTransformationFunction::ENTITY;
        Ok(OspLinearTransformationFunction {
            name: required_identifier(ENTITY, "name", self.name)?,
            factor: self.factor.ok_or_else(|| missing(ENTITY, "factor"))?,
            offset: self.offset.ok_or_else(|| missing(ENTITY, "offset"))?,
        })
    }
}

/// Scalar sum of `input_count` inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspSumFunction {
    pub name: String,
    pub input_count: u32,
}

impl OspSumFunction {
    pub fn new(name: impl Into<String>, input_count: u32) -> Self {
        Self {
            name: name.into(),
            input_count,
        }
    }

    pub fn builder() -> OspSumFunctionBuilder {
        OspSumFunctionBuilder::default()
    }
}

impl DictXml for OspSumFunction {
    const ENTITY: &'static str = "OspSumFunction";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "input_count"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            name: wire::string(dict, Self::ENTITY, NAME_KEY)?,
            input_count: wire::count(dict, Self::ENTITY, INPUT_COUNT_KEY)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(NAME_KEY.to_owned(), Value::from(self.name.as_str()));
        dict.insert(INPUT_COUNT_KEY.to_owned(), Value::from(self.input_count));
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspSumFunctionBuilder {
    name: Option<String>,
    input_count: Option<u32>,
}

impl OspSumFunctionBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn input_count(mut self, input_count: u32) -> Self {
        self.input_count = Some(input_count);
        self
    }

    pub fn build(self) -> Result<OspSumFunction> {
        const ENTITY: &str = OspSumFunction::ENTITY;
        Ok(OspSumFunction {
            name: required_identifier(ENTITY, "name", self.name)?,
            input_count: self.input_count.ok_or_else(|| missing(ENTITY, "input_count"))?,
        })
    }
}

/// Element-wise sum of `input_count` vectors of length `dimension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspVectorSumFunction {
    pub name: String,
    pub input_count: u32,
    pub dimension: u32,
}

impl OspVectorSumFunction {
    pub fn new(name: impl Into<String>, input_count: u32, dimension: u32) -> Self {
        Self {
            name: name.into(),
            input_count,
            dimension,
        }
    }

    pub fn builder() -> OspVectorSumFunctionBuilder {
        OspVectorSumFunctionBuilder::default()
    }
}

impl DictXml for OspVectorSumFunction {
    const ENTITY: &'static str = "OspVectorSumFunction";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "input_count", "dimension"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            name: wire::string(dict, Self::ENTITY, NAME_KEY)?,
            input_count: wire::count(dict, Self::ENTITY, INPUT_COUNT_KEY)?,
            dimension: wire::count(dict, Self::ENTITY, DIMENSION_KEY)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(NAME_KEY.to_owned(), Value::from(self.name.as_str()));
        dict.insert(INPUT_COUNT_KEY.to_owned(), Value::from(self.input_count));
        dict.insert(DIMENSION_KEY.to_owned(), Value::from(self.dimension));
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspVectorSumFunctionBuilder {
    name: Option<String>,
    input_count: Option<u32>,
    dimension: Option<u32>,
}

impl OspVectorSumFunctionBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn input_count(mut self, input_count: u32) -> Self {
        self.input_count = Some(input_count);
        self
    }

    pub fn dimension(mut self, dimension: u32) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn build(self) -> Result<OspVectorSumFunction> {
        const ENTITY: &str = OspVectorSumFunction::ENTITY;
        Ok(OspVectorSumFunction {
            name: required_identifier(ENTITY, "name", self.name)?,
            input_count: self.input_count.ok_or_else(|| missing(ENTITY, "input_count"))?,
            dimension: self.dimension.ok_or_else(|| missing(ENTITY, "dimension"))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    LinearTransformation,
    Sum,
    VectorSum,
}

impl FunctionKind {
    pub const ALL: [FunctionKind; 3] = [
        FunctionKind::LinearTransformation,
        FunctionKind::Sum,
        FunctionKind::VectorSum,
    ];

    pub const fn kind_name(self) -> &'static str {
        match self {
            FunctionKind::LinearTransformation => "LinearTransformation",
            FunctionKind::Sum => "Sum",
            FunctionKind::VectorSum => "VectorSum",
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

impl FromStr for FunctionKind {
    type Err = ModelError;

    fn from_str(tag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.kind_name() == tag)
            .ok_or_else(|| ModelError::UnsupportedVariant {
                family: "function",
                tag: tag.to_owned(),
            })
    }
}

/// Any one function.
#[derive(Debug, Clone, PartialEq)]
pub enum OspFunction {
    LinearTransformation(OspLinearTransformationFunction),
    Sum(OspSumFunction),
    VectorSum(OspVectorSumFunction),
}

impl OspFunction {
    pub fn kind(&self) -> FunctionKind {
        match self {
            OspFunction::LinearTransformation(_) => FunctionKind::LinearTransformation,
            OspFunction::Sum(_) => FunctionKind::Sum,
            OspFunction::VectorSum(_) => FunctionKind::VectorSum,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().kind_name()
    }

    pub fn name(&self) -> &str {
        match self {
            OspFunction::LinearTransformation(function) => &function.name,
            OspFunction::Sum(function) => &function.name,
            OspFunction::VectorSum(function) => &function.name,
        }
    }

    pub fn from_dict_xml(kind: FunctionKind, dict: &XmlDict) -> Result<Self> {
        let function: OspFunction = match kind {
            FunctionKind::LinearTransformation => {
                OspLinearTransformationFunction::from_dict_xml(dict)?.into()
            }
            FunctionKind::Sum => OspSumFunction::from_dict_xml(dict)?.into(),
            FunctionKind::VectorSum => OspVectorSumFunction::from_dict_xml(dict)?.into(),
        };
        Ok(function)
    }

    pub fn to_dict_xml(&self) -> XmlDict {
        match self {
            OspFunction::LinearTransformation(function) => function.to_dict_xml(),
            OspFunction::Sum(function) => function.to_dict_xml(),
            OspFunction::VectorSum(function) => function.to_dict_xml(),
        }
    }
}

impl From<OspLinearTransformationFunction> for OspFunction {
    fn from(function: OspLinearTransformationFunction) -> Self {
        OspFunction::LinearTransformation(function)
    }
}

impl From<OspSumFunction> for OspFunction {
    fn from(function: OspSumFunction) -> Self {
        OspFunction::Sum(function)
    }
}

impl From<OspVectorSumFunction> for OspFunction {
    fn from(function: OspVectorSumFunction) -> Self {
        OspFunction::VectorSum(function)
    }
}

/// Functions of a system, one list per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OspFunctions {
    pub linear_transformations: Vec<OspLinearTransformationFunction>,
    pub sums: Vec<OspSumFunction>,
    pub vector_sums: Vec<OspVectorSumFunction>,
}

impl OspFunctions {
    pub const ENTITY: &'static str = "OspFunctions";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: impl Into<OspFunction>) {
        match function.into() {
            OspFunction::LinearTransformation(f) => self.linear_transformations.push(f),
            OspFunction::Sum(f) => self.sums.push(f),
            OspFunction::VectorSum(f) => self.vector_sums.push(f),
        }
    }

    pub fn count(&self, kind: FunctionKind) -> usize {
        match kind {
            FunctionKind::LinearTransformation => self.linear_transformations.len(),
            FunctionKind::Sum => self.sums.len(),
            FunctionKind::VectorSum => self.vector_sums.len(),
        }
    }

    pub fn len(&self) -> usize {
        FunctionKind::ALL.into_iter().map(|kind| self.count(kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Function by name, searched across all kinds.
    pub fn function(&self, name: &str) -> Option<OspFunction> {
        self.linear_transformations
            .iter()
            .find(|f| f.name == name)
            .cloned()
            .map(OspFunction::from)
            .or_else(|| self.sums.iter().find(|f| f.name == name).cloned().map(OspFunction::from))
            .or_else(|| {
                self.vector_sums
                    .iter()
                    .find(|f| f.name == name)
                    .cloned()
                    .map(OspFunction::from)
            })
    }

    pub fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        let mut functions = Self::new();
        for kind in FunctionKind::ALL {
            for item in wire::list(dict, Self::ENTITY, kind.kind_name())? {
                functions.add_function(OspFunction::from_dict_xml(kind, item)?);
            }
        }
        Ok(functions)
    }

    /// `None` when there are no functions at all; empty kinds are left out.
    pub fn to_dict_xml(&self) -> Option<XmlDict> {
        if self.is_empty() {
            return None;
        }
        let mut dict = XmlDict::new();
        let mut insert = |kind: FunctionKind, items: Vec<XmlDict>| {
            if !items.is_empty() {
                dict.insert(kind.kind_name().to_owned(), wire::list_value(items));
            }
        };
        insert(
            FunctionKind::LinearTransformation,
            self.linear_transformations
                .iter()
                .map(DictXml::to_dict_xml)
                .collect(),
        );
        insert(
            FunctionKind::Sum,
            self.sums.iter().map(DictXml::to_dict_xml).collect(),
        );
        insert(
            FunctionKind::VectorSum,
            self.vector_sums.iter().map(DictXml::to_dict_xml).collect(),
        );
        Some(dict)
    }
}
