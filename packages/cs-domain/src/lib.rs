pub mod codec;
pub mod params;
pub mod preferences;
pub mod results;
pub mod search;

pub use codec::StateDefaults;
pub use params::{Hyperparameters, ParamValue};
pub use preferences::{StoredPreferences, Theme};
pub use results::{Article, Author, AuthorProfile, Plot, RankedItems, ResultSet, Vote};
pub use search::{
	FileHandle, InputError, Mode, PersonName, SearchInput, SearchQuery, SearchState, Target,
};
