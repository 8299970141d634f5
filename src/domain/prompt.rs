use crate::domain::SearchResult;

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

pub const DEFAULT_ANSWER_TEMPLATE: &str = "\
You are an IT helpdesk specialist for an enterprise IT system.
Your job is to recommend actionable solutions based strictly on retrieved past cases.

Follow these strict rules:
1) Recommend only context-supported solutions relevant to the user query.
2) Do not guess or fabricate - only use retrieved facts.
3) List multiple valid solutions as bullets.
4) After each solution, briefly state why it works.

Here are some issue-resolution pairs:

{context}

Answer the user's question using ONLY the information above. Answer in bullet form where possible.
If the answer is not found in the data, say \"I don't know based on the stored issues but these are the possible resolution from the internet\" and propose a generic answer.

User question:
{question}
";

/// Grounded-answer prompt with `{context}` and `{question}` slots.
///
/// Substitution happens in a single left-to-right pass, so placeholder-like
/// text inside retrieved documents or the question is left untouched.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    separator: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ANSWER_TEMPLATE)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            separator: "\n\n".to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn render(&self, matches: &[SearchResult], question: &str) -> String {
        let context = matches
            .iter()
            .map(|m| m.record.document())
            .collect::<Vec<_>>()
            .join(&self.separator);

        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        loop {
            let next = [
                (rest.find(CONTEXT_PLACEHOLDER), CONTEXT_PLACEHOLDER, context.as_str()),
                (rest.find(QUESTION_PLACEHOLDER), QUESTION_PLACEHOLDER, question),
            ]
            .into_iter()
            .filter_map(|(pos, placeholder, value)| pos.map(|p| (p, placeholder, value)))
            .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, placeholder, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueResolution, Record};

    fn hit(issue: &str, resolution: &str) -> SearchResult {
        SearchResult {
            record: Record::new(IssueResolution::new(issue, resolution)),
            score: 1.0,
        }
    }

    #[test]
    fn test_render_substitutes_both_slots() {
        let template = PromptTemplate::new("Context:\n{context}\n\nQ: {question}");
        let prompt = template.render(
            &[hit("printer offline", "restart print spooler"), hit("vpn drops", "update client")],
            "my printer won't print",
        );

        assert_eq!(
            prompt,
            "Context:\nIssue: printer offline\nResolution: restart print spooler\n\n\
             Issue: vpn drops\nResolution: update client\n\nQ: my printer won't print"
        );
    }

    #[test]
    fn test_render_leaves_placeholders_in_values() {
        let template = PromptTemplate::new("{context}|{question}");
        let prompt = template.render(&[hit("{question}", "fix")], "what about {context}?");

        assert_eq!(
            prompt,
            "Issue: {question}\nResolution: fix|what about {context}?"
        );
    }

    #[test]
    fn test_render_custom_separator() {
        let template = PromptTemplate::new("{context}").with_separator("\n---\n");
        let prompt = template.render(&[hit("a", "b"), hit("c", "d")], "q");
        assert_eq!(prompt, "Issue: a\nResolution: b\n---\nIssue: c\nResolution: d");
    }
}
