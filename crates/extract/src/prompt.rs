pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        r#"Extract knowledge graph triples from the following text.

INSTRUCTIONS:
1. Identify the entities mentioned in the text and the relationships between them
2. Express each relationship as one triple: subject, predicate, object
3. Output ONLY a JSON array, nothing else

SCHEMA:
[
  {{"subject": "...", "predicate": "...", "object": "..."}}
]

RULES:
- Subjects and objects are entity names taken from the text
- Predicates are short verb phrases: "causes", "regulates", "studies", etc.
- No markdown, no code blocks, no explanations

TEXT:
{}

JSON ARRAY:"#,
        text
    )
}
