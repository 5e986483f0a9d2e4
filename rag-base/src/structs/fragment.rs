use serde::{Deserialize, Serialize};

/// A retrieved context fragment, ranked by cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Chunk id inside the index (`chunk-00042`).
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Joins fragment texts into the context block handed to the model.
pub fn join_fragments(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
