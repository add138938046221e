use birdwatch_core::IdentificationResult;

use crate::agent::AgentPrompt;

/// Name of the web search tool the research agent is allowed to call.
pub const SEARCH_TOOL_NAME: &str = "search_google";

/// Description advertised to the model for the search tool.
pub const SEARCH_TOOL_DESCRIPTION: &str =
    "Search Google for a query and return the organic results as JSON \
     (title, link, snippet for each result).";

/// Stage B: find habitat, diet and migration sources for the identified species.
pub const AGENT: AgentPrompt = AgentPrompt {
    name: "Bird Habitat Researcher",
    role: "Searches for habitat, diet, and migration patterns of a given bird species using \
           region-specific data.",
    description: "You are a birdwatching and wildlife ecology researcher. Based on the identified \
                  bird species and location, construct a focused web search to find behavioral, \
                  feeding, nesting, and migration info from reliable sources.",
    instructions: &[
        "Take the bird's common and scientific name and location into account.",
        "Create a highly focused Google search query (e.g., 'Barn Swallow migration and diet \
         North America').",
        "Use `search_google` with that query.",
        "Return 10 of the most relevant links in a markdown bullet list.",
        "Exclude ads, duplicates, and generic sites. Do not summarize content.",
    ],
    add_datetime: true,
};

/// The research agent receives the identification text unchanged.
pub fn user_message(identification: &IdentificationResult) -> String {
    identification.as_str().to_string()
}
