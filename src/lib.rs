#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

pub mod errors;
pub mod utils;
pub mod index;
pub mod outfit;
pub mod catalog;
pub mod flags;
pub mod avatar;

pub use avatar::{AssetPayload, Avatar, AvatarComposer, ComposerEvent, MemoryLoader, WearableLoader};
pub use catalog::{Catalog, CatalogSource, Location};
pub use errors::EffigyError;
pub use flags::{FeatureFlags, FlagValue};
pub use index::{AssetIndexer, AssetRef, Indexable};
pub use outfit::{EquipOutcome, OutfitController, SlotId, SlotRegistry, Wearable, WearableTraits};
pub use utils::interner;
