//! Embedded chat page.
//!
//! A single self-contained HTML document, so the gateway ships as one
//! binary. The script posts each line to `/chat` and relies on the
//! session cookie set when the page was served.

use axum::response::Html;

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>CampusDesk</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }
  #log { border: 1px solid #ccc; border-radius: 6px; height: 26rem; overflow-y: auto; padding: .75rem; }
  .msg { margin: .4rem 0; white-space: pre-wrap; }
  .you { text-align: right; color: #1a4d8f; }
  .bot { color: #222; }
  form { display: flex; gap: .5rem; margin-top: .75rem; }
  input { flex: 1; padding: .5rem; }
</style>
</head>
<body>
<h1>CampusDesk</h1>
<p>Ask about admissions, fees, results, accommodation or your registered courses.</p>
<div id="log"></div>
<form id="chat">
  <input id="message" autocomplete="off" placeholder="Type your question" autofocus>
  <button type="submit">Send</button>
</form>
<script>
const log = document.getElementById("log");
const input = document.getElementById("message");

function show(text, who) {
  const line = document.createElement("div");
  line.className = "msg " + who;
  line.textContent = text;
  log.appendChild(line);
  log.scrollTop = log.scrollHeight;
}

document.getElementById("chat").addEventListener("submit", async (event) => {
  event.preventDefault();
  const message = input.value;
  if (!message.trim()) return;
  input.value = "";
  show(message, "you");
  try {
    const res = await fetch("/chat", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      credentials: "same-origin",
      body: JSON.stringify({ message }),
    });
    const body = await res.json();
    show(body.reply, "bot");
  } catch (err) {
    show("The assistant is unavailable right now. Please try again.", "bot");
  }
});
</script>
</body>
</html>
"#;

pub fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_posts_to_chat_endpoint() {
        assert!(INDEX_HTML.starts_with("<!DOCTYPE html>"));
        assert!(INDEX_HTML.contains("<title>CampusDesk</title>"));
        assert!(INDEX_HTML.contains(r#"fetch("/chat""#));
    }
}
