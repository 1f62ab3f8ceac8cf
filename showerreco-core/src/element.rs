//! Typed element store for passing intermediate shower results between
//! reconstruction stages.

use std::collections::{BTreeMap, HashMap};

use nalgebra::{Point3, Vector3};

use crate::error::CandidateError;
use crate::hit::Hit;
use crate::space_point::SpacePoint;
use crate::trajectory::Trajectory;

/// A value held in the element store.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A 3D position.
    Point(Point3<f64>),
    /// A 3D vector, usually a direction.
    Vector(Vector3<f64>),
    /// A single scalar.
    Scalar(f64),
    /// A single integer, e.g. a plane index.
    Integer(i64),
    /// A list of scalars.
    Values(Vec<f64>),
    /// Plane index to ordered list of values.
    PlaneValues(BTreeMap<u32, Vec<f64>>),
    /// An initial track trajectory.
    Trajectory(Trajectory),
    /// A list of space points.
    SpacePoints(Vec<SpacePoint>),
    /// A list of hits.
    Hits(Vec<Hit>),
}

/// Types that can be stored in and read back from the element store.
pub trait ElementValue: Sized {
    /// Name of the type in error messages.
    const KIND: &'static str;

    /// Borrows the value if the element holds this type.
    fn from_element(element: &Element) -> Option<&Self>;

    /// Wraps the value in an element.
    fn into_element(self) -> Element;
}

macro_rules! element_value {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl ElementValue for $ty {
            const KIND: &'static str = $kind;

            fn from_element(element: &Element) -> Option<&Self> {
                match element {
                    Element::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn into_element(self) -> Element {
                Element::$variant(self)
            }
        }
    };
}

element_value!(Point3<f64>, Point, "point");
element_value!(Vector3<f64>, Vector, "vector");
element_value!(f64, Scalar, "scalar");
element_value!(i64, Integer, "integer");
element_value!(Vec<f64>, Values, "value list");
element_value!(BTreeMap<u32, Vec<f64>>, PlaneValues, "plane value map");
element_value!(Trajectory, Trajectory, "trajectory");
element_value!(Vec<SpacePoint>, SpacePoints, "space point list");
element_value!(Vec<Hit>, Hits, "hit list");

/// Labelled store of shower elements for one candidate.
#[derive(Debug, Clone, Default)]
pub struct ShowerElementHolder {
    elements: HashMap<String, Element>,
}

impl ShowerElementHolder {
    /// Creates an empty holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an element is set under the label.
    #[must_use]
    pub fn check_element(&self, label: &str) -> bool {
        self.elements.contains_key(label)
    }

    /// Reads an element of type `T`.
    ///
    /// # Errors
    /// Returns [`CandidateError::MissingElement`] if the label is not set and
    /// [`CandidateError::ElementType`] if it holds a different type.
    pub fn get_element<T: ElementValue>(&self, label: &str) -> Result<&T, CandidateError> {
        let element = self
            .elements
            .get(label)
            .ok_or_else(|| CandidateError::MissingElement(label.to_owned()))?;
        T::from_element(element).ok_or_else(|| CandidateError::ElementType {
            label: label.to_owned(),
            expected: T::KIND,
        })
    }

    /// Stores an element, replacing any previous value under the label.
    pub fn set_element<T: ElementValue>(&mut self, value: T, label: &str) {
        self.elements.insert(label.to_owned(), value.into_element());
    }

    /// Removes and returns an element.
    pub fn remove_element(&mut self, label: &str) -> Option<Element> {
        self.elements.remove(label)
    }

    /// Iterates over the labels currently set.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Number of elements set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
