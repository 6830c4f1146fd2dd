use super::parser::Dialog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const PRODUCT_MIN_CHARS: usize = 10;
const PRODUCT_MAX_CHARS: usize = 100;
const PROBLEM_MAX_CHARS: usize = 200;
const SOLUTION_MAX_CHARS: usize = 300;
/// Words kept on each side of a product keyword.
const PRODUCT_WINDOW: usize = 2;

/// Vocabulary used to mine a dialog export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRules {
    pub customer_label: String,
    pub agent_label: String,
    pub product_keywords: Vec<String>,
    pub problem_markers: Vec<String>,
}

impl KnowledgeRules {
    /// Defaults for an optics retailer's support desk.
    pub fn optics_retail() -> Self {
        Self {
            customer_label: "Клиент".to_string(),
            agent_label: "Наш сотрудник".to_string(),
            product_keywords: lowered(&[
                "прицел",
                "оптика",
                "микроскоп",
                "бинокль",
                "монокуляр",
                "телескоп",
                "сетка",
                "кратность",
                "объектив",
                "линза",
                "диоптрия",
                "фокус",
                "параллакс",
                "MOA",
                "настройка",
                "пристрелка",
                "вынос",
                "щелчок",
            ]),
            problem_markers: lowered(&["как", "почему", "не работает", "проблема", "помогите"]),
        }
    }
}

impl Default for KnowledgeRules {
    fn default() -> Self {
        Self::optics_retail()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionPair {
    pub problem: String,
    pub solution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExtractedKnowledge {
    pub products: Vec<String>,
    pub problems: Vec<String>,
    pub solutions: Vec<SolutionPair>,
}

pub(crate) fn extract_knowledge(dialogs: &[Dialog], rules: &KnowledgeRules) -> ExtractedKnowledge {
    let mut products = BTreeSet::new();
    let mut problems = BTreeSet::new();
    let mut solutions = Vec::new();

    for dialog in dialogs {
        let first_customer_message = dialog
            .messages
            .iter()
            .find(|message| message.source == rules.customer_label);

        for message in &dialog.messages {
            let content = message.content.to_lowercase();

            for keyword in &rules.product_keywords {
                if content.contains(keyword.as_str()) {
                    collect_product_mentions(&content, keyword, &mut products);
                }
            }

            if message.source == rules.customer_label
                && rules
                    .problem_markers
                    .iter()
                    .any(|marker| content.contains(marker.as_str()))
            {
                problems.insert(truncate_chars(&message.content, PROBLEM_MAX_CHARS));
            }

            if message.source == rules.agent_label {
                if let Some(customer) = first_customer_message {
                    solutions.push(SolutionPair {
                        problem: truncate_chars(&customer.content, PROBLEM_MAX_CHARS),
                        solution: truncate_chars(&message.content, SOLUTION_MAX_CHARS),
                    });
                }
            }
        }
    }

    ExtractedKnowledge {
        products: products.into_iter().collect(),
        problems: problems.into_iter().collect(),
        solutions,
    }
}

/// Keeps a small word window around each keyword hit; the first word of a message is
/// never treated as a hit.
fn collect_product_mentions(content: &str, keyword: &str, products: &mut BTreeSet<String>) {
    let words: Vec<&str> = content.split_whitespace().collect();
    for (index, word) in words.iter().enumerate() {
        if index == 0 || !word.contains(keyword) {
            continue;
        }
        let start = index.saturating_sub(PRODUCT_WINDOW);
        let end = (index + PRODUCT_WINDOW + 1).min(words.len());
        let mention = words[start..end].join(" ");
        if mention.chars().count() > PRODUCT_MIN_CHARS {
            products.insert(truncate_chars(&mention, PRODUCT_MAX_CHARS));
        }
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

fn lowered(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::parser::DialogMessage;

    fn message(source: &str, content: &str) -> DialogMessage {
        DialogMessage {
            source: source.to_string(),
            content: content.to_string(),
        }
    }

    fn dialog(id: &str, messages: Vec<DialogMessage>) -> Dialog {
        Dialog {
            dialog_id: id.to_string(),
            messages,
        }
    }

    #[test]
    fn product_window_surrounds_keyword() {
        let dialogs = vec![dialog(
            "1",
            vec![message(
                "Клиент",
                "Подскажите, у меня новый прицел Vortex 4-16 не держит ноль",
            )],
        )];
        let knowledge = extract_knowledge(&dialogs, &KnowledgeRules::optics_retail());
        assert_eq!(knowledge.products, vec!["меня новый прицел vortex 4-16"]);
    }

    #[test]
    fn keyword_in_first_word_is_ignored() {
        let dialogs = vec![dialog("1", vec![message("Клиент", "Прицел пришёл вовремя")])];
        let knowledge = extract_knowledge(&dialogs, &KnowledgeRules::optics_retail());
        assert!(knowledge.products.is_empty());
    }

    #[test]
    fn uppercase_keywords_match_lowercased_content() {
        let dialogs = vec![dialog(
            "1",
            vec![message("Наш сотрудник", "Один щелчок барабана равен 1/4 MOA на 100 м")],
        )];
        let knowledge = extract_knowledge(&dialogs, &KnowledgeRules::optics_retail());
        assert!(knowledge
            .products
            .iter()
            .any(|product| product.contains("moa")));
    }

    #[test]
    fn customer_questions_become_problems() {
        let dialogs = vec![dialog(
            "1",
            vec![
                message("Клиент", "Почему сетка смещается после выстрела?"),
                message("Наш сотрудник", "Как настроить параллакс?"),
                message("Клиент", "Спасибо"),
            ],
        )];
        let knowledge = extract_knowledge(&dialogs, &KnowledgeRules::optics_retail());
        assert_eq!(
            knowledge.problems,
            vec!["Почему сетка смещается после выстрела?"]
        );
    }

    #[test]
    fn agent_replies_pair_with_first_customer_message() {
        let dialogs = vec![
            dialog(
                "1",
                vec![
                    message("Клиент", "Бинокль не фокусируется"),
                    message("Наш сотрудник", "Проверьте диоптрийную подстройку"),
                    message("Клиент", "Не помогло"),
                    message("Наш сотрудник", "Оформим обмен"),
                ],
            ),
            dialog("2", vec![message("Наш сотрудник", "Добрый день!")]),
        ];
        let knowledge = extract_knowledge(&dialogs, &KnowledgeRules::optics_retail());
        assert_eq!(knowledge.solutions.len(), 2);
        assert!(knowledge
            .solutions
            .iter()
            .all(|pair| pair.problem == "Бинокль не фокусируется"));
        assert_eq!(knowledge.solutions[1].solution, "Оформим обмен");
    }

    #[test]
    fn long_texts_are_truncated_by_characters() {
        let long = "проблема ".repeat(40);
        let dialogs = vec![dialog("1", vec![message("Клиент", &long)])];
        let knowledge = extract_knowledge(&dialogs, &KnowledgeRules::optics_retail());
        assert_eq!(knowledge.problems[0].chars().count(), PROBLEM_MAX_CHARS);
    }
}
