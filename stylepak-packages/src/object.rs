//! The closed set of package object kinds.

use crate::error::{PackageError, Result};
use crate::item::Item;
use crate::item_config::ItemConfig;
use crate::object_type::ObjectType;
use crate::pack_list::PackList;
use crate::parsed::ParseData;
use crate::quote_pack::QuotePack;
use crate::selectable::{Elevator, Music, Skybox};
use crate::style::Style;
use crate::stylevar::StyleVar;
use stylepak_types::ObjectId;

/// Behaviour every package object kind provides.
///
/// `parse` builds the object from its info block. `add_over` folds an
/// override of the same id into the primary; its semantics are kind-specific.
pub trait PakObjectKind: Sized + Send + Sync + 'static {
    const TYPE: ObjectType;

    fn parse(data: &ParseData<'_>) -> Result<Self>;

    fn add_over(&mut self, over: Self) -> Result<()>;

    fn id(&self) -> &ObjectId;

    fn into_object(self) -> PakObject;

    fn from_object(obj: &PakObject) -> Option<&Self>;

    fn from_object_mut(obj: &mut PakObject) -> Option<&mut Self>;
}

macro_rules! pak_objects {
    ($($variant:ident),+ $(,)?) => {
        /// Any parsed package object.
        #[derive(Debug, Clone)]
        pub enum PakObject {
            $($variant($variant),)+
        }

        impl PakObject {
            #[must_use]
            pub fn obj_type(&self) -> ObjectType {
                match self {
                    $(Self::$variant(_) => ObjectType::$variant,)+
                }
            }

            #[must_use]
            pub fn id(&self) -> &ObjectId {
                match self {
                    $(Self::$variant(obj) => obj.id(),)+
                }
            }

            /// Folds `over` into this object. Both must be the same kind.
            pub fn add_over(&mut self, over: PakObject) -> Result<()> {
                let expected = self.obj_type();
                match (self, over) {
                    $((Self::$variant(ours), Self::$variant(theirs)) => ours.add_over(theirs),)+
                    (_, theirs) => Err(PackageError::TypeMismatch {
                        expected,
                        found: theirs.obj_type(),
                    }),
                }
            }
        }

        $(
            impl From<$variant> for PakObject {
                fn from(obj: $variant) -> Self {
                    Self::$variant(obj)
                }
            }
        )+
    };
}

pak_objects!(Style, Item, ItemConfig, QuotePack, Music, Skybox, Elevator, StyleVar, PackList);

/// Implements the object conversions of [`PakObjectKind`] for a kind.
macro_rules! object_conversions {
    ($variant:ident) => {
        fn into_object(self) -> $crate::object::PakObject {
            $crate::object::PakObject::$variant(self)
        }

        fn from_object(obj: &$crate::object::PakObject) -> Option<&Self> {
            match obj {
                $crate::object::PakObject::$variant(inner) => Some(inner),
                _ => None,
            }
        }

        fn from_object_mut(obj: &mut $crate::object::PakObject) -> Option<&mut Self> {
            match obj {
                $crate::object::PakObject::$variant(inner) => Some(inner),
                _ => None,
            }
        }
    };
}

pub(crate) use object_conversions;
