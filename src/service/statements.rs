//! Statement bundle use cases

use crate::graph::{GraphError, GraphResult, ThingId};
use crate::query::{Bundle, BundleConfiguration, Sort};
use crate::storage::{StatementRepository, ThingRepository};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct StatementService {
    statements: Arc<dyn StatementRepository>,
    things: Arc<dyn ThingRepository>,
}

impl StatementService {
    pub fn new(statements: Arc<dyn StatementRepository>, things: Arc<dyn ThingRepository>) -> Self {
        Self { statements, things }
    }

    /// Fetch the bundle rooted at `thing_id`.
    ///
    /// With `include_first`, the direct statements of the thing are merged
    /// in even when the configuration would filter them out.
    pub fn fetch_as_bundle(
        &self,
        thing_id: &ThingId,
        configuration: &BundleConfiguration,
        include_first: bool,
        sort: &Sort,
    ) -> GraphResult<Bundle> {
        if self.things.find_thing_by_id(thing_id)?.is_none() {
            warn!(thing = %thing_id, "bundle root not found");
            return Err(GraphError::ThingNotFound(thing_id.clone()));
        }

        let statements = self.statements.fetch_as_bundle(thing_id, configuration, sort)?;
        let mut bundle = Bundle::new(thing_id.clone(), statements);

        if include_first {
            let first = self.statements.fetch_as_bundle(
                thing_id,
                &BundleConfiguration::first_level(),
                sort,
            )?;
            bundle = bundle.merge(Bundle::new(thing_id.clone(), first), sort);
        }

        debug!(thing = %thing_id, statements = bundle.len(), "bundle fetched");
        Ok(bundle)
    }
}
