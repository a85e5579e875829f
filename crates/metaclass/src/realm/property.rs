//! Property slots and their attributes

use super::heap::ObjectId;
use super::value::Value;

/// Slot attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    /// Value can be reassigned (data slots only)
    pub writable: bool,
    /// Slot shows up in key enumeration
    pub enumerable: bool,
    /// Slot can be redefined or deleted
    pub configurable: bool,
}

impl Attributes {
    /// Attributes of a slot created by plain assignment
    pub const fn open() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable, configurable, not enumerable (methods, back-references)
    pub const fn hidden() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Read-only but still configurable (`name`, `length`)
    pub const fn read_only() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: true,
        }
    }

    /// Read-only and permanently fixed
    pub const fn locked() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::open()
    }
}

/// A property slot
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Stored value
    Data {
        /// The value
        value: Value,
        /// Slot attributes
        attributes: Attributes,
    },
    /// Computed accessor
    Accessor {
        /// Getter function
        get: Option<ObjectId>,
        /// Setter function
        set: Option<ObjectId>,
        /// Show up in key enumeration
        enumerable: bool,
        /// Can be redefined or deleted
        configurable: bool,
    },
}

impl Property {
    /// Create a data slot
    pub fn data(value: impl Into<Value>, attributes: Attributes) -> Self {
        Property::Data {
            value: value.into(),
            attributes,
        }
    }

    /// Create an enumerable, configurable accessor slot
    pub fn accessor(get: Option<ObjectId>, set: Option<ObjectId>) -> Self {
        Property::Accessor {
            get,
            set,
            enumerable: true,
            configurable: true,
        }
    }

    /// Check if this slot holds a plain value
    pub fn is_data(&self) -> bool {
        matches!(self, Property::Data { .. })
    }

    /// Check if this slot can be redefined
    pub fn is_configurable(&self) -> bool {
        match self {
            Property::Data { attributes, .. } => attributes.configurable,
            Property::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Check if this slot is enumerable
    pub fn is_enumerable(&self) -> bool {
        match self {
            Property::Data { attributes, .. } => attributes.enumerable,
            Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    /// Check if this slot can be assigned
    pub fn is_writable(&self) -> bool {
        match self {
            Property::Data { attributes, .. } => attributes.writable,
            Property::Accessor { set, .. } => set.is_some(),
        }
    }

    /// Get the stored value (data slots only)
    pub fn value(&self) -> Option<&Value> {
        match self {
            Property::Data { value, .. } => Some(value),
            Property::Accessor { .. } => None,
        }
    }

    /// Check whether `next` may replace `self` on a non-configurable slot.
    ///
    /// A non-configurable slot stays non-configurable; a writable data slot
    /// may still change its value or drop its writability.
    pub(crate) fn permits_redefinition(&self, next: &Property) -> bool {
        if self.is_configurable() {
            return true;
        }
        if next.is_configurable() || next.is_enumerable() != self.is_enumerable() {
            return false;
        }
        match (self, next) {
            (
                Property::Data {
                    value: old,
                    attributes: old_attrs,
                },
                Property::Data {
                    value: new,
                    attributes: new_attrs,
                },
            ) => old_attrs.writable || (!new_attrs.writable && old == new),
            (old, new) => old == new,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configurable_slot_accepts_anything() {
        let old = Property::data(1, Attributes::open());
        assert!(old.permits_redefinition(&Property::accessor(None, None)));
    }

    #[test]
    fn test_locked_slot_rejects_changes() {
        let old = Property::data(1, Attributes::locked());
        assert!(!old.permits_redefinition(&Property::data(2, Attributes::locked())));
        assert!(old.permits_redefinition(&Property::data(1, Attributes::locked())));
        assert!(!old.permits_redefinition(&Property::data(1, Attributes::read_only())));
    }

    #[test]
    fn test_writable_non_configurable_can_be_frozen() {
        let old = Property::data(
            1,
            Attributes {
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        assert!(old.permits_redefinition(&Property::data(2, Attributes::locked())));
    }
}
