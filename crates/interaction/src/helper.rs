//! Start-up registration of the MAL area itself.

use std::sync::Arc;

use mal_encoding::Result;
use mal_encoding::error::standard;
use mal_encoding::structures::{MAL_AREA_NAME, MAL_AREA_NUMBER, MAL_AREA_VERSION, mal_elements};
use tracing::debug;

use crate::area::Area;
use crate::context::MalRegistry;

/// Registers the MAL area's attributes, structures and standard errors.
pub struct MalHelper;

impl MalHelper {
	/// The MAL area: every attribute and structure with its list, no services.
	pub fn area() -> Result<Area> {
		Area::new(
			MAL_AREA_NUMBER,
			MAL_AREA_NAME,
			MAL_AREA_VERSION,
			mal_elements(),
			Vec::new(),
		)
	}

	/// Loads the MAL area and the standard error catalogue into `registry`.
	///
	/// Safe to call more than once, also concurrently; every call returns the
	/// same registered area.
	pub fn init(registry: &MalRegistry) -> Result<Arc<Area>> {
		let area = registry.get_or_load_area(MAL_AREA_NUMBER, MAL_AREA_VERSION, Self::area)?;
		for &(number, name) in standard::CATALOGUE {
			registry.register_error(number.get(), name)?;
		}
		debug!(errors = standard::CATALOGUE.len(), "MAL area initialised");
		Ok(area)
	}
}
