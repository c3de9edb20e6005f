// Roadmap generator prompt templates.

pub const ROADMAP_INSTRUCTION: &str = r#"Generate a tree-structured learning roadmap, rendered as a flow graph, for the position or skills the user asks about.

- Vertical tree layout with meaningful x/y positions; leave generous space between nodes.
- Structure similar to the roadmap.sh layout.
- Steps ordered from fundamentals to advanced.
- Branch for different specializations where it makes sense.
- Every node has a title, a short description and a learning resource link.
- Unique ids for all nodes and edges. Edges only connect ids that exist in initialNodes.

Return JSON in exactly this format:
{
  "roadmapTitle": "Title",
  "description": "3-5 lines",
  "duration": "e.g. 6 months",
  "initialNodes": [
    {
      "id": "1",
      "type": "turbo",
      "position": { "x": 0, "y": 0 },
      "data": {
        "title": "Step Title",
        "description": "Short two-line explanation of what the step covers.",
        "link": "Helpful link for learning this step"
      }
    }
  ],
  "initialEdges": [
    { "id": "e1-2", "source": "1", "target": "2" }
  ]
}"#;

/// Replace `{user_input}`.
pub const ROADMAP_PROMPT: &str = "Create a learning roadmap for: {user_input}";
