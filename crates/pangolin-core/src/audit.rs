// Audit comments.
//
// Uncommitted config changes can carry a per-xpath comment that lands
// in the config log at commit time. Both directions go through op
// commands; there is nothing to cache.

use pangolin_api::{Client, Element, Error, XPath};

/// Attach an audit comment to the uncommitted change at `xpath`.
pub async fn set_comment(client: &Client, xpath: &XPath, comment: &str) -> Result<(), Error> {
    let cmd = Element::new("set").child(
        Element::new("audit-comment")
            .text_child("xpath", xpath.to_string())
            .text_child("comment", comment),
    );
    client.op(&cmd, None, None).await?;
    Ok(())
}

/// The last uncommitted audit comment for `xpath`; empty when none was
/// set since the previous commit.
pub async fn current_comment(client: &Client, xpath: &XPath) -> Result<String, Error> {
    let cmd = Element::new("show").child(
        Element::new("config").child(
            Element::new("list").child(
                Element::new("audit-comments").text_child("xpath", xpath.to_string()),
            ),
        ),
    );
    let root = client.op(&cmd, None, None).await?;
    let result = root.find("result");
    let comment = result
        .and_then(|r| r.find("entry"))
        .and_then(|e| e.child_text("comment"))
        .or_else(|| result.and_then(|r| r.child_text("comment")))
        .unwrap_or_default();
    Ok(comment.to_owned())
}
