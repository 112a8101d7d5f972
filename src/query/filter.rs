//! Typed where-clause evaluation.
//!
//! Each predicate is evaluated against the sub-index owning its
//! property; the per-property posting lists are then intersected, so a
//! clause is a logical AND across properties. Predicates are ordinary
//! serde values, spelled the way the engine's JSON DSL spells them
//! (`{"between": [15, 35]}`, `{"radius": {...}}`), which makes the
//! one-operator-per-predicate rule structural.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, Language};
use crate::data::{GeoPoint, InternalId};
use crate::error::{CallaError, Result};
use crate::geo::to_meters;
use crate::index::directory::{IndexDirectory, Tree};
use crate::index::flat::{EnumArrayPredicate, EnumPredicate};

/// Operators over numeric properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberPredicate {
    Eq(f64),
    Gt(f64),
    Gte(f64),
    Lt(f64),
    Lte(f64),
    /// Inclusive `[min, max]`; an inverted range matches nothing.
    Between([f64; 2]),
}

/// Radius filter over a geopoint property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusPredicate {
    pub coordinates: GeoPoint,
    /// Distance in `unit`.
    pub value: f64,
    /// Distance unit; defaults to meters.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Keep points inside (default) or strictly outside the disc.
    #[serde(default = "default_inside")]
    pub inside: bool,
    /// Great-circle distance instead of the equirectangular default.
    #[serde(default)]
    pub high_precision: bool,
}

/// Polygon filter over a geopoint property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonPredicate {
    pub coordinates: Vec<GeoPoint>,
    #[serde(default = "default_inside")]
    pub inside: bool,
    #[serde(default)]
    pub high_precision: bool,
}

fn default_unit() -> String {
    "m".to_string()
}

fn default_inside() -> bool {
    true
}

/// Operators over geopoint properties: exactly one of radius or polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoPredicate {
    Radius(RadiusPredicate),
    Polygon(PolygonPredicate),
}

/// A predicate over one property of the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    /// Boolean literal for bool properties.
    Bool(bool),
    /// Term match on a text property (tokenized, exact per token).
    Text(String),
    /// Any-of term match on a text property.
    TextList(Vec<String>),
    /// Numeric operator on a number property.
    Number(NumberPredicate),
    /// Radius or polygon filter on a geopoint property.
    Geo(GeoPredicate),
    /// Array operator on an enum[] property.
    EnumArray(EnumArrayPredicate),
    /// Scalar operator on an enum property.
    Enum(EnumPredicate),
}

/// Ordered conjunction of per-property predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhereClause {
    conditions: Vec<(String, Predicate)>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition on `property`.
    pub fn filter(mut self, property: impl Into<String>, predicate: Predicate) -> Self {
        self.conditions.push((property.into(), predicate));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Predicate)> {
        self.conditions.iter()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl IndexDirectory {
    /// Evaluate every predicate and intersect the resulting posting
    /// lists.
    ///
    /// The output keeps the order ids first appear in the first
    /// condition's list, reduced to a set.
    pub fn search_by_where_clause(
        &self,
        clause: &WhereClause,
        analyzer: &dyn Analyzer,
        language: Option<Language>,
    ) -> Result<Vec<InternalId>> {
        let mut lists: Vec<Vec<InternalId>> = Vec::with_capacity(clause.len());
        for (property, predicate) in clause.iter() {
            lists.push(self.evaluate(property, predicate, analyzer, language)?);
        }
        Ok(intersect(lists))
    }

    fn evaluate(
        &self,
        property: &str,
        predicate: &Predicate,
        analyzer: &dyn Analyzer,
        language: Option<Language>,
    ) -> Result<Vec<InternalId>> {
        let Some(tree) = self.tree(property) else {
            if self.vector_slot(property).is_some() {
                return Err(CallaError::invalid_filter_operation(
                    property,
                    "vector properties cannot be filtered",
                ));
            }
            return Err(CallaError::unknown_filter_property(property));
        };

        match (tree, predicate) {
            (Tree::Bool(bools), Predicate::Bool(v)) => Ok(bools.where_value(*v).to_vec()),

            (Tree::Bkd(bkd), Predicate::Geo(GeoPredicate::Radius(radius))) => {
                let meters = to_meters(radius.value, &radius.unit).ok_or_else(|| {
                    CallaError::invalid_filter_operation(
                        property,
                        format!("unknown distance unit '{}'", radius.unit),
                    )
                })?;
                Ok(bkd.search_by_radius(
                    radius.coordinates,
                    meters,
                    radius.inside,
                    radius.high_precision,
                ))
            }
            (Tree::Bkd(bkd), Predicate::Geo(GeoPredicate::Polygon(polygon))) => Ok(bkd
                .search_by_polygon(
                    &polygon.coordinates,
                    polygon.inside,
                    polygon.high_precision,
                )),

            (Tree::Radix(radix), Predicate::Text(term)) => {
                Ok(Self::match_terms(radix, &[term.clone()], analyzer, language, property))
            }
            (Tree::Radix(radix), Predicate::TextList(terms)) => {
                Ok(Self::match_terms(radix, terms, analyzer, language, property))
            }

            (Tree::Flat(flat), Predicate::Enum(op)) => {
                if flat.is_array() {
                    return Err(CallaError::invalid_filter_operation(
                        property,
                        "scalar operator applied to an array property",
                    ));
                }
                Ok(flat.filter(op))
            }
            (Tree::Flat(flat), Predicate::EnumArray(op)) => {
                if !flat.is_array() {
                    return Err(CallaError::invalid_filter_operation(
                        property,
                        "array operator applied to a scalar property",
                    ));
                }
                Ok(flat.filter_arr(op))
            }

            (Tree::Avl(avl), Predicate::Number(op)) => Ok(match op {
                NumberPredicate::Eq(key) => avl.find(*key).map(<[_]>::to_vec).unwrap_or_default(),
                NumberPredicate::Gt(key) => avl.greater_than(*key, false),
                NumberPredicate::Gte(key) => avl.greater_than(*key, true),
                NumberPredicate::Lt(key) => avl.less_than(*key, false),
                NumberPredicate::Lte(key) => avl.less_than(*key, true),
                NumberPredicate::Between([min, max]) => avl.range_search(*min, *max),
            }),

            (tree, _) => Err(CallaError::invalid_filter_operation(
                property,
                format!("predicate does not apply to a {} index", tree.type_tag()),
            )),
        }
    }

    fn match_terms(
        radix: &crate::index::radix::RadixIndex,
        terms: &[String],
        analyzer: &dyn Analyzer,
        language: Option<Language>,
        property: &str,
    ) -> Vec<InternalId> {
        let mut out = Vec::new();
        let mut seen = AHashSet::new();
        for term in terms {
            for token in analyzer.analyze(term, language, Some(property)) {
                for (_, ids) in radix.find(&token, true, 0) {
                    for id in ids {
                        if seen.insert(id) {
                            out.push(id);
                        }
                    }
                }
            }
        }
        out
    }
}

/// Intersect posting lists as sets, preserving the first list's order
/// of first appearance. Membership checks run smallest set first.
fn intersect(lists: Vec<Vec<InternalId>>) -> Vec<InternalId> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };

    let mut sets: Vec<AHashSet<InternalId>> = rest
        .iter()
        .map(|list| list.iter().copied().collect())
        .collect();
    sets.sort_by_key(|s| s.len());

    let mut seen = AHashSet::new();
    first
        .iter()
        .copied()
        .filter(|id| seen.insert(*id) && sets.iter().all(|s| s.contains(id)))
        .collect()
}
