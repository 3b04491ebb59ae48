use pulldown_cmark::{html, Options, Parser};

/// Render markdown to HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Render a message body: assistant text as markdown, user text escaped.
pub fn render_message_content(content: &str, use_markdown: bool) -> String {
    if use_markdown {
        render_markdown(content)
    } else {
        crate::utils::escape_html(content).replace('\n', "<br>")
    }
}
