use crate::messenger::Messenger;
use n64_app::prelude::*;
use web_sys::Document;

/// Status line, layout class and button label in the host page
pub struct DomView {
    document: Document,
    status_id: String,
    toggle_id: String,
    mobile_class: String,
    messenger: Messenger<ClientMessage, LoaderNotice>,
}

impl DomView {
    pub fn new(
        document: Document,
        config: &LoaderConfig,
        messenger: Messenger<ClientMessage, LoaderNotice>,
    ) -> Self {
        Self {
            document,
            status_id: config.elements.status.clone(),
            toggle_id: config.elements.toggle_mobile.clone(),
            mobile_class: config.mobile_class.clone(),
            messenger,
        }
    }
}

impl PageView for DomView {
    fn show_status(&self, message: &str) -> Result<(), String> {
        self.messenger.send(&LoaderNotice::Status {
            message: message.to_owned(),
        });
        let element = self
            .document
            .get_element_by_id(&self.status_id)
            .ok_or_else(|| format!("no #{} element", self.status_id))?;
        element.set_text_content(Some(message));
        Ok(())
    }

    fn apply_layout(&self, layout: Layout) -> Result<(), String> {
        let body = self.document.body().ok_or("document has no <body>")?;
        body.class_list()
            .toggle_with_force(&self.mobile_class, layout.is_mobile())
            .map_err(|e| format!("{e:?}"))?;

        if let Some(button) = self.document.get_element_by_id(&self.toggle_id) {
            button.set_text_content(Some(layout.toggle_label()));
        }
        Ok(())
    }
}
