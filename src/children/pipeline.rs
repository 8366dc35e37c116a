// Pipeline graph: which purpose follows which, under which request filters.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::ids::PurposeId;
use crate::labware::{LabwareSnapshot, Request};

/// Request attributes a pipeline applies to; an empty list matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFilters {
    #[serde(default)]
    pub request_type_key: Vec<String>,
    #[serde(default)]
    pub library_type: Vec<String>,
}

impl PipelineFilters {
    pub fn is_unconstrained(&self) -> bool {
        self.request_type_key.is_empty() && self.library_type.is_empty()
    }

    pub fn matches(&self, request: &Request) -> bool {
        let type_matches = self.request_type_key.is_empty()
            || self.request_type_key.contains(&request.request_type_key);
        let library_matches = self.library_type.is_empty()
            || request
                .library_type
                .as_ref()
                .is_some_and(|library_type| self.library_type.contains(library_type));
        type_matches && library_matches
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default)]
    pub pipeline_group: Option<String>,
    #[serde(default)]
    pub filters: PipelineFilters,
    /// parent purpose -> child purpose
    #[serde(default)]
    pub relationships: IndexMap<PurposeId, PurposeId>,
    /// Purpose whose labware is passed as the finished library
    #[serde(default)]
    pub library_pass: Option<PurposeId>,
}

impl Pipeline {
    pub fn child_of(&self, purpose: &str) -> Option<&PurposeId> {
        self.relationships.get(purpose)
    }

    /// Whether the labware carries work this pipeline applies to
    pub fn filters_match(&self, labware: &LabwareSnapshot) -> bool {
        self.filters.is_unconstrained()
            || labware
                .active_requests()
                .any(|request| self.filters.matches(request))
    }

    /// Active for the labware and relating its purpose to a child
    pub fn is_active_for(&self, labware: &LabwareSnapshot) -> bool {
        self.child_of(labware.purpose.id.as_str()).is_some() && self.filters_match(labware)
    }

    pub fn purposes(&self) -> impl Iterator<Item = &PurposeId> {
        self.relationships
            .iter()
            .flat_map(|(parent, child)| [parent, child])
            .chain(self.library_pass.iter())
    }
}

/// All pipelines of a deployment, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineGraph {
    pipelines: Vec<Pipeline>,
}

impl PipelineGraph {
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        Self { pipelines }
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn active_for<'a>(
        &'a self,
        labware: &'a LabwareSnapshot,
    ) -> impl Iterator<Item = &'a Pipeline> + 'a {
        self.pipelines
            .iter()
            .filter(move |pipeline| pipeline.is_active_for(labware))
    }

    /// Children reachable from the labware through its active pipelines,
    /// de-duplicated in pipeline declaration order
    pub fn children_for(&self, labware: &LabwareSnapshot) -> IndexSet<PurposeId> {
        let purpose = labware.purpose.id.as_str();
        self.active_for(labware)
            .filter_map(|pipeline| pipeline.child_of(purpose))
            .cloned()
            .collect()
    }

    /// Pipelines in which this labware is the finished library
    pub fn library_pass_for<'a>(
        &'a self,
        labware: &'a LabwareSnapshot,
    ) -> impl Iterator<Item = &'a Pipeline> + 'a {
        self.pipelines.iter().filter(move |pipeline| {
            pipeline
                .library_pass
                .as_ref()
                .is_some_and(|purpose| purpose == &labware.purpose.id)
                && pipeline.filters_match(labware)
        })
    }
}
