// Fixed instructions appended after the uploaded documents.

pub const COMPARE_PROMPT: &str = "Compare the key findings and benchmarks of these papers. \
    Provide results in a table.";

pub const SUMMARIZE_PROMPT: &str = "Summarize the main findings and contributions of these \
    papers in concise bullet points.";
