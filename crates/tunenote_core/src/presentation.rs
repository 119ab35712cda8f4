//! Presentation template builders.
//!
//! The migration engine only decides where the managed template lives on a
//! record. What it renders is owned by a `PresentationBuilder`.

use crate::model::metadata::TemplateTag;
use crate::model::record::{ManagedRecord, Template};

pub const TUNE_TEMPLATE_NAME: &str = "Tune";

const TUNE_QUESTION: &str = "<div class=\"tune-prompt\">{{Tune Type}}</div>\n";

const TUNE_ANSWER: &str = r#"{{FrontSide}}

<hr id=answer>

<div class="tune-name">{{Name}}</div>
{{#Link}}<a class="tune-link" href="{{Link}}">{{Link}}</a>{{/Link}}

{{#ABC}}
<pre id="abcSource">
{{ABC}}
</pre>

<div id="renderedAbc"></div>
{{/ABC}}
"#;

/// Builds the managed presentation template for a record.
///
/// Implementations must be deterministic for a given record so that template
/// sync stays idempotent.
pub trait PresentationBuilder {
    fn build(&self, record: &ManagedRecord) -> Template;
}

/// Default tune card: tune type on the front, name, link and ABC on the back.
#[derive(Debug, Clone, Copy, Default)]
pub struct TuneCardBuilder;

impl PresentationBuilder for TuneCardBuilder {
    fn build(&self, record: &ManagedRecord) -> Template {
        let mut template = Template::new(TUNE_TEMPLATE_NAME);
        template.question = TUNE_QUESTION.to_string();
        template.answer = if record.has_field("Key") {
            TUNE_ANSWER.replace(
                "<div class=\"tune-name\">{{Name}}</div>",
                "<div class=\"tune-name\">{{Name}}</div>\n{{#Key}}<div class=\"tune-key\">{{Key}}</div>{{/Key}}",
            )
        } else {
            TUNE_ANSWER.to_string()
        };
        TemplateTag::write(&mut template.metadata);
        template
    }
}

#[cfg(test)]
mod tests {
    use super::{PresentationBuilder, TuneCardBuilder, TUNE_TEMPLATE_NAME};
    use crate::model::record::ManagedRecord;

    #[test]
    fn builds_tagged_deterministic_template() {
        let record = ManagedRecord::new("Tunes");
        let first = TuneCardBuilder.build(&record);
        let second = TuneCardBuilder.build(&record);

        assert_eq!(first, second);
        assert_eq!(first.name, TUNE_TEMPLATE_NAME);
        assert!(first.is_managed());
        assert!(first.answer.contains("{{ABC}}"));
    }

    #[test]
    fn shows_key_only_when_record_has_key_field() {
        let mut record = ManagedRecord::new("Tunes");
        assert!(!TuneCardBuilder.build(&record).answer.contains("{{Key}}"));

        record.add_field("Key");
        assert!(TuneCardBuilder.build(&record).answer.contains("{{Key}}"));
    }
}
