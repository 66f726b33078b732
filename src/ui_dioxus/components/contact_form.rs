use dioxus::prelude::*;
use crate::domain::contact::{ContactField, ContactForm as ContactFormData};
use crate::page;
use crate::services::error_handling::Notice;
use crate::services::validation::ContactValidator;
use crate::ui_dioxus::app::SiteContext;
use tracing::info;

const INPUT_STYLE: &str = "width: 100%; padding: 8px 12px; border-radius: 4px; font-size: 14px; font-family: inherit;";

fn border(invalid: bool) -> &'static str {
    if invalid { "border: 1px solid #ef4444;" } else { "border: 1px solid #ddd;" }
}

#[component]
pub fn ContactForm() -> Element {
    let site = use_context::<SiteContext>();
    let mut notice = use_context::<Signal<Option<Notice>>>();

    let mut form = use_signal(ContactFormData::default);
    let mut invalid = use_signal(|| None::<ContactField>);
    let mut submitting = use_signal(|| false);
    let mut inputs = use_signal(Vec::<(ContactField, MountedEvent)>::new);

    let delay = site.config.contact_submit_delay();
    let on_submit = move |_: FormEvent| {
        if *submitting.read() {
            return;
        }
        match ContactValidator::validate(&form.read()) {
            Err(error) => {
                invalid.set(Some(error.field));
                notice.set(Some(Notice::error(error.message)));
                let target = inputs
                    .read()
                    .iter()
                    .find(|(field, _)| *field == error.field)
                    .map(|(_, mounted)| mounted.clone());
                if let Some(mounted) = target {
                    spawn(async move {
                        let _ = mounted.set_focus(true).await;
                    });
                }
            }
            Ok(valid) => {
                invalid.set(None);
                submitting.set(true);
                spawn(async move {
                    // No backend endpoint yet; the send is simulated.
                    page::sleep(delay).await;
                    info!(from = %valid.email, "Contact message accepted");
                    notice.set(Some(Notice::success("Thanks! Your message has been sent.")));
                    form.write().reset();
                    submitting.set(false);
                });
            }
        }
    };

    let current = form.read().clone();
    let flagged = *invalid.read();
    let field_style = |field: ContactField, extra: &str| {
        format!("{} {} {}", INPUT_STYLE, extra, border(flagged == Some(field)))
    };
    let name_style = field_style(ContactField::Name, "");
    let email_style = field_style(ContactField::Email, "");
    let message_style = field_style(ContactField::Message, "min-height: 120px;");

    rsx! {
        form {
            id: "contact-form",
            style: "display: flex; flex-direction: column; gap: 12px; max-width: 480px;",
            prevent_default: "onsubmit",
            onsubmit: on_submit,

            input {
                name: ContactField::Name.input_name(),
                r#type: "text",
                placeholder: "Your name",
                style: "{name_style}",
                value: "{current.name}",
                oninput: move |e| form.write().name = e.value(),
                onmounted: move |e| inputs.write().push((ContactField::Name, e)),
            }
            input {
                name: ContactField::Email.input_name(),
                r#type: "email",
                placeholder: "Your email",
                style: "{email_style}",
                value: "{current.email}",
                oninput: move |e| form.write().email = e.value(),
                onmounted: move |e| inputs.write().push((ContactField::Email, e)),
            }
            textarea {
                name: ContactField::Message.input_name(),
                placeholder: "Your message",
                style: "{message_style}",
                value: "{current.message}",
                oninput: move |e| form.write().message = e.value(),
                onmounted: move |e| inputs.write().push((ContactField::Message, e)),
            }
            button {
                r#type: "submit",
                style: "padding: 10px 20px; border: none; background: #3b82f6; color: white;
                       border-radius: 4px; cursor: pointer; font-size: 14px;",
                disabled: *submitting.read(),
                if *submitting.read() { "Sending..." } else { "Send message" }
            }
        }
    }
}
