use crate::docx::props::{
    restyle_paragraph_properties, restyle_run_properties, ParagraphFormat, RunFormat,
};
use crate::docx::xml::{collect_subtree, find_attr, XmlEvent};

/// Subtrees whose text is not part of the paragraph's own reading order.
const DETACHED_CONTAINERS: &[&str] = &["w:txbxContent", "mc:Fallback", "w:del", "w:moveFrom", "w:pPr"];

/// One body-level `w:p`, owning its event subtree.
#[derive(Clone, Debug)]
pub struct Paragraph {
    events: Vec<XmlEvent>,
}

impl Paragraph {
    pub(crate) fn from_events(events: Vec<XmlEvent>) -> Self {
        Self { events }
    }

    pub(crate) fn events(&self) -> &[XmlEvent] {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut Vec<XmlEvent> {
        &mut self.events
    }

    /// Visible text, trimmed: `w:t` content with tabs and line breaks from run
    /// controls, excluding text boxes and deleted text.
    pub fn text(&self) -> String {
        self.raw_text().trim().to_string()
    }

    fn raw_text(&self) -> String {
        let mut out = String::new();
        walk_inline(&self.events, |ev, parent| match ev {
            XmlEvent::Text { text } if parent == "w:t" => out.push_str(text),
            XmlEvent::Start { name, attrs } | XmlEvent::Empty { name, attrs } if parent == "w:r" => {
                control_append(&mut out, name, attrs)
            }
            _ => {}
        });
        out
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    /// Number of `w:r` elements carrying the paragraph's inline content,
    /// including runs wrapped in hyperlinks, fields, insertions and content controls.
    pub fn run_count(&self) -> usize {
        let mut count = 0usize;
        walk_inline(&self.events, |ev, _| {
            if ev.is_start_of("w:r") || ev.is_empty_of("w:r") {
                count += 1;
            }
        });
        count
    }

    /// Gives a run-less paragraph that still has text exactly one run carrying
    /// that text. Text nodes sitting outside any run are moved into the new run,
    /// so nothing is duplicated. Returns whether a run was added.
    pub fn adopt_run(&mut self) -> bool {
        if self.run_count() > 0 {
            return false;
        }
        let carried = self.raw_text();
        if carried.trim().is_empty() {
            return false;
        }

        let mut out: Vec<XmlEvent> = Vec::with_capacity(self.events.len() + 5);
        let mut stack: Vec<String> = Vec::new();
        let mut detached_depth: Option<usize> = None;
        let mut i = 0usize;
        while i < self.events.len() {
            let ev = &self.events[i];
            if detached_depth.is_none() && ev.is_start_of("w:t") {
                let (_, next) = collect_subtree(&self.events, i);
                i = next;
                continue;
            }
            match ev {
                XmlEvent::Start { name, .. } => {
                    if detached_depth.is_none() && DETACHED_CONTAINERS.contains(&name.as_str()) {
                        detached_depth = Some(stack.len());
                    }
                    stack.push(name.clone());
                }
                XmlEvent::End { .. } => {
                    stack.pop();
                    if detached_depth == Some(stack.len()) {
                        detached_depth = None;
                    }
                    if stack.is_empty() {
                        out.extend(text_run(&carried));
                    }
                }
                _ => {}
            }
            out.push(ev.clone());
            i += 1;
        }
        self.events = out;
        true
    }

    /// Rewrites the `w:rPr` of every inline run with `fmt`.
    pub fn apply_run_format(&mut self, fmt: &RunFormat) {
        let mut out: Vec<XmlEvent> = Vec::with_capacity(self.events.len() + 8);
        let mut stack: Vec<String> = Vec::new();
        let mut detached_depth: Option<usize> = None;
        let mut i = 0usize;
        while i < self.events.len() {
            let ev = &self.events[i];
            let is_run = ev.is_start_of("w:r") || ev.is_empty_of("w:r");
            if detached_depth.is_none() && is_run {
                let (run, next) = collect_subtree(&self.events, i);
                out.extend(restyle_run(&run, fmt));
                i = next;
                continue;
            }
            match ev {
                XmlEvent::Start { name, .. } => {
                    if detached_depth.is_none() && DETACHED_CONTAINERS.contains(&name.as_str()) {
                        detached_depth = Some(stack.len());
                    }
                    stack.push(name.clone());
                }
                XmlEvent::End { .. } => {
                    stack.pop();
                    if detached_depth == Some(stack.len()) {
                        detached_depth = None;
                    }
                }
                _ => {}
            }
            out.push(ev.clone());
            i += 1;
        }
        self.events = out;
    }

    /// Rewrites the paragraph's own `w:pPr` with `fmt`, creating it if needed.
    pub fn apply_paragraph_format(&mut self, fmt: &ParagraphFormat) {
        let (p_name, p_attrs, inner) = match self.events.first() {
            Some(XmlEvent::Empty { name, attrs }) => (name.clone(), attrs.clone(), Vec::new()),
            Some(XmlEvent::Start { name, attrs }) => (
                name.clone(),
                attrs.clone(),
                self.events[1..self.events.len().saturating_sub(1)].to_vec(),
            ),
            _ => return,
        };

        let mut rest_start = 0usize;
        let mut existing: Option<Vec<XmlEvent>> = None;
        let mut leading: Vec<XmlEvent> = Vec::new();
        while rest_start < inner.len() {
            let ev = &inner[rest_start];
            if ev.is_start_of("w:pPr") || ev.is_empty_of("w:pPr") {
                let (ppr, next) = collect_subtree(&inner, rest_start);
                existing = Some(ppr);
                rest_start = next;
                break;
            }
            if ev.is_whitespace_text() {
                leading.push(ev.clone());
                rest_start += 1;
                continue;
            }
            break;
        }

        let mut out: Vec<XmlEvent> = Vec::with_capacity(inner.len() + 8);
        out.push(XmlEvent::start(&p_name, p_attrs));
        out.extend(leading);
        out.extend(restyle_paragraph_properties(existing.as_deref(), fmt));
        out.extend_from_slice(&inner[rest_start..]);
        out.push(XmlEvent::end(&p_name));
        self.events = out;
    }

    pub fn has_page_break_before(&self) -> bool {
        let mut depth = 0usize;
        let mut in_ppr = false;
        for ev in &self.events {
            match ev {
                XmlEvent::Start { name, .. } => {
                    depth += 1;
                    if depth == 2 && name == "w:pPr" {
                        in_ppr = true;
                    }
                }
                XmlEvent::Empty { name, attrs } if in_ppr && depth == 2 && name == "w:pageBreakBefore" => {
                    return !matches!(find_attr(attrs, "w:val"), Some("0") | Some("false"));
                }
                XmlEvent::End { .. } => {
                    if depth == 2 {
                        in_ppr = false;
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
        }
        false
    }
}

/// Visits inline events of a paragraph with the name of their parent
/// element, skipping detached containers.
fn walk_inline(events: &[XmlEvent], mut visit: impl FnMut(&XmlEvent, &str)) {
    let mut stack: Vec<&str> = Vec::new();
    let mut detached_depth: Option<usize> = None;
    for ev in events {
        let parent = stack.last().copied().unwrap_or("");
        match ev {
            XmlEvent::Start { name, .. } => {
                if detached_depth.is_none() && DETACHED_CONTAINERS.contains(&name.as_str()) {
                    detached_depth = Some(stack.len());
                }
                if detached_depth.is_none() {
                    visit(ev, parent);
                }
                stack.push(name.as_str());
            }
            XmlEvent::End { .. } => {
                stack.pop();
                if detached_depth == Some(stack.len()) {
                    detached_depth = None;
                }
            }
            _ => {
                if detached_depth.is_none() {
                    visit(ev, parent);
                }
            }
        }
    }
}

fn control_append(buf: &mut String, name: &str, attrs: &[(String, String)]) {
    match name {
        "w:tab" | "w:ptab" => buf.push('\t'),
        "w:cr" => buf.push('\n'),
        "w:br" => {
            if find_attr(attrs, "w:type").unwrap_or("textWrapping") == "textWrapping" {
                buf.push('\n');
            }
        }
        "w:noBreakHyphen" => buf.push('-'),
        _ => {}
    }
}

fn text_run(text: &str) -> Vec<XmlEvent> {
    let mut t_attrs: Vec<(String, String)> = Vec::new();
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t_attrs.push(("xml:space".to_string(), "preserve".to_string()));
    }
    vec![
        XmlEvent::start("w:r", Vec::new()),
        XmlEvent::start("w:t", t_attrs),
        XmlEvent::Text {
            text: text.to_string(),
        },
        XmlEvent::end("w:t"),
        XmlEvent::end("w:r"),
    ]
}

/// Rewrites one `w:r` subtree so its `w:rPr` carries `fmt`.
fn restyle_run(run: &[XmlEvent], fmt: &RunFormat) -> Vec<XmlEvent> {
    let (name, attrs) = match run.first() {
        Some(XmlEvent::Start { name, attrs }) | Some(XmlEvent::Empty { name, attrs }) => {
            (name.clone(), attrs.clone())
        }
        _ => return run.to_vec(),
    };
    let inner: &[XmlEvent] = if run.len() >= 2 {
        &run[1..run.len() - 1]
    } else {
        &[]
    };

    let mut i = 0usize;
    while i < inner.len() && inner[i].is_whitespace_text() {
        i += 1;
    }
    let mut existing: Option<Vec<XmlEvent>> = None;
    if i < inner.len() && (inner[i].is_start_of("w:rPr") || inner[i].is_empty_of("w:rPr")) {
        let (rpr, next) = collect_subtree(inner, i);
        existing = Some(rpr);
        i = next;
    } else {
        i = 0;
    }

    let mut out = Vec::with_capacity(inner.len() + 10);
    out.push(XmlEvent::start(&name, attrs));
    out.extend(restyle_run_properties(existing.as_deref(), fmt));
    out.extend_from_slice(&inner[i..]);
    out.push(XmlEvent::end(&name));
    out
}
