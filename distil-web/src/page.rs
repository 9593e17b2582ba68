//! The single-page UI, served as static HTML.

/// Index page: text + schema in, extracted JSON out.
pub const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>distil</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
  h1 { font-size: 1.4rem; }
  label { display: block; margin: 1rem 0 0.25rem; font-weight: 600; }
  textarea { width: 100%; min-height: 10rem; font-family: ui-monospace, monospace; font-size: 0.9rem; }
  button { margin-top: 1rem; padding: 0.5rem 1.5rem; font-size: 1rem; cursor: pointer; }
  pre { background: #f4f4f4; padding: 1rem; overflow-x: auto; min-height: 3rem; }
  .error { color: #b00020; }
</style>
</head>
<body>
<h1>distil &mdash; structured extraction</h1>
<p>Paste free-form text and a JSON Schema. The model extracts data from the text that conforms to the schema.</p>

<label for="text">Text</label>
<textarea id="text" placeholder="The Louvre in Paris opened in 1793 and holds about 38,000 objects..."></textarea>

<label for="schema">JSON Schema</label>
<textarea id="schema">{
  "type": "object",
  "properties": {
    "name": { "type": "string" },
    "city": { "type": "string" },
    "opened": { "type": "integer" }
  },
  "required": ["name"]
}</textarea>

<button id="run">Extract</button>

<label>Result</label>
<pre id="result"></pre>

<script>
const run = document.getElementById('run');
const result = document.getElementById('result');
run.addEventListener('click', async () => {
  result.classList.remove('error');
  result.textContent = 'Extracting...';
  run.disabled = true;
  try {
    const response = await fetch('/api/extract', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({
        text: document.getElementById('text').value,
        schema: document.getElementById('schema').value,
      }),
    });
    const body = await response.json();
    if (!response.ok) {
      result.classList.add('error');
      result.textContent = body.error || ('HTTP ' + response.status);
    } else {
      result.textContent = JSON.stringify(body.data, null, 2);
    }
  } catch (e) {
    result.classList.add('error');
    result.textContent = String(e);
  } finally {
    run.disabled = false;
  }
});
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_posts_to_the_extract_endpoint() {
        assert!(INDEX_HTML.contains("/api/extract"));
        assert!(INDEX_HTML.contains("id=\"schema\""));
    }
}
