//! Identity and metadata binding

use crate::error::MetaResult;
use crate::realm::{Attributes, ObjectId, Property, Realm};

/// Fix an entity's naming slots and link it with its instance template.
///
/// `template.constructor` is written last so a failure leaves the caller's
/// template untouched.
pub fn bind(realm: &mut Realm, entity: ObjectId, name: &str, template: ObjectId) -> MetaResult<()> {
    let to_string_tag = realm.intrinsics().to_string_tag;
    realm.define_property(entity, "name", Property::data(name, Attributes::read_only()))?;
    realm.define_property(entity, to_string_tag, Property::data(name, Attributes::read_only()))?;
    realm.define_property(entity, "displayName", Property::data(name, Attributes::read_only()))?;
    realm.define_property(entity, "prototype", Property::data(template, Attributes::locked()))?;
    realm.define_property(template, "constructor", Property::data(entity, Attributes::hidden()))?;
    Ok(())
}
