use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire form of an id. Backends disagree on whether ids are strings or
/// integers, so both are accepted and normalized to text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "RawId", into = "String")]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<RawId> for $name {
            fn from(value: RawId) -> Self {
                Self(value.into())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(CommentId);
id_newtype!(AnswerId);
id_newtype!(QuestionId);
id_newtype!(UserId);

/// The entity a comment hangs off. Cache entries are keyed by this, so an
/// answer and a question sharing the same raw id never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    Answer(AnswerId),
    Question(QuestionId),
}

impl ParentRef {
    pub fn kind(&self) -> &'static str {
        match self {
            ParentRef::Answer(_) => "answer",
            ParentRef::Question(_) => "question",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ParentRef::Answer(id) => id.as_str(),
            ParentRef::Question(id) => id.as_str(),
        }
    }
}

impl From<AnswerId> for ParentRef {
    fn from(value: AnswerId) -> Self {
        ParentRef::Answer(value)
    }
}

impl From<QuestionId> for ParentRef {
    fn from(value: QuestionId) -> Self {
        ParentRef::Question(value)
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_strings_and_integers() {
        let text: CommentId = serde_json::from_str("\"c9\"").expect("string id");
        let number: CommentId = serde_json::from_str("42").expect("numeric id");
        assert_eq!(text, CommentId::new("c9"));
        assert_eq!(number, CommentId::new("42"));
        assert_eq!(serde_json::to_string(&number).expect("encode"), "\"42\"");
    }

    #[test]
    fn answer_and_question_keys_are_distinct() {
        let answer = ParentRef::from(AnswerId::new("7"));
        let question = ParentRef::from(QuestionId::new("7"));
        assert_ne!(answer, question);
        assert_eq!(answer.to_string(), "answer:7");
        assert_eq!(question.to_string(), "question:7");
    }
}
