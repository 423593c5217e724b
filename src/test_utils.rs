//! Test utilities
//!
//! [`ScriptLog`] records the scripts a document runs, in the order they run.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::Document;

/// Records the source of every script a document runs
///
/// ```
/// use html_include::Document;
/// use html_include::test_utils::ScriptLog;
///
/// let mut document = Document::new();
/// let log = ScriptLog::new();
/// document.set_script_runner(log.runner());
///
/// let script = document.create_element("script");
/// document.set_text_content(script, "hello()").unwrap();
/// document.append_child(document.root(), script).unwrap();
/// assert_eq!(log.sources(), vec!["hello()"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptLog {
    sources: Rc<RefCell<Vec<String>>>,
}

impl ScriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runner(&self) -> impl FnMut(&str, &Document) + 'static {
        let sources = self.sources.clone();
        move |source: &str, _: &Document| sources.borrow_mut().push(source.trim().to_string())
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.borrow().clone()
    }
}
