// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model registry.
//!
//! Maps dense model IDs to loader instances. The registry is plain state —
//! a host embeds as many independent managers as it wants rather than
//! sharing one process-wide singleton. It may be moved across threads as
//! long as each model is driven by one thread at a time.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::loader::{IfcLoader, LoaderSettings, RawLineData};
use crate::schema::IfcSchema;

pub struct ModelManager {
    models: Vec<Option<IfcLoader>>,
    schema: Arc<IfcSchema>,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::with_schema(Arc::new(IfcSchema::new()))
    }

    /// A manager whose models share a caller-built schema table.
    pub fn with_schema(schema: Arc<IfcSchema>) -> Self {
        ModelManager {
            models: Vec::new(),
            schema,
        }
    }

    /// Parses raw STEP bytes and registers the resulting model.
    pub fn open_model(&mut self, content: &[u8], settings: LoaderSettings) -> Result<u32> {
        let loader = IfcLoader::open(content, settings, Arc::clone(&self.schema))?;
        Ok(self.register(loader))
    }

    /// Registers an empty model with an empty tape.
    pub fn create_model(&mut self, settings: LoaderSettings) -> u32 {
        self.register(IfcLoader::new(settings, Arc::clone(&self.schema)))
    }

    fn register(&mut self, loader: IfcLoader) -> u32 {
        let model_id = self.models.len() as u32;
        self.models.push(Some(loader));
        debug!(model_id, "model registered");
        model_id
    }

    /// Releases the model's tape and indices. The ID is not reused.
    pub fn close_model(&mut self, model_id: u32) -> Result<()> {
        let slot = self
            .models
            .get_mut(model_id as usize)
            .ok_or(Error::BadHandle(model_id))?;
        if slot.take().is_none() {
            return Err(Error::BadHandle(model_id));
        }
        debug!(model_id, "model closed");
        Ok(())
    }

    pub fn is_model_open(&self, model_id: u32) -> bool {
        matches!(self.models.get(model_id as usize), Some(Some(_)))
    }

    pub fn loader(&self, model_id: u32) -> Result<&IfcLoader> {
        self.models
            .get(model_id as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::BadHandle(model_id))
    }

    pub fn loader_mut(&mut self, model_id: u32) -> Result<&mut IfcLoader> {
        self.models
            .get_mut(model_id as usize)
            .and_then(Option::as_mut)
            .ok_or(Error::BadHandle(model_id))
    }

    pub fn get_line(&mut self, model_id: u32, express_id: u32) -> Result<RawLineData> {
        self.loader_mut(model_id)?.get_line(express_id)
    }

    pub fn write_line(&mut self, model_id: u32, raw: &RawLineData) -> Result<()> {
        self.loader_mut(model_id)?.write_line(raw)
    }

    /// Express IDs of every line with the given type, in file order.
    pub fn get_line_ids_with_type(&self, model_id: u32, ifc_type: u16) -> Result<Vec<u32>> {
        Ok(self.loader(model_id)?.express_ids_with_type(ifc_type))
    }

    /// Every express ID, in LineID order.
    pub fn get_all_lines(&self, model_id: u32) -> Result<Vec<u32>> {
        Ok(self.loader(model_id)?.all_express_ids())
    }

    pub fn export_file_as_ifc(&mut self, model_id: u32) -> Result<String> {
        Ok(self.loader_mut(model_id)?.dump_as_ifc())
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}
