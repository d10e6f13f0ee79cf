//! Implementation of the `tagsmith tags` command.

use crate::error::Result;
use crate::grammar::{TagFamily, TagSet};

/// Execute the `tagsmith tags` command.
pub fn cmd_tags() -> Result<()> {
    print!("{}", tag_listing()?);
    Ok(())
}

/// Registered tags of each family, in the order lines are matched.
pub(crate) fn tag_listing() -> Result<String> {
    let mut out = String::new();
    for (heading, family) in [("Prompt tags", TagFamily::Prompt), ("Cleanup tags", TagFamily::Cleanup)] {
        let tags = TagSet::new(family)?;
        out.push_str(heading);
        out.push_str(":\n");
        for (index, descriptor) in tags.descriptors().enumerate() {
            out.push_str(&format!(
                "  {:>2}. {:<62} {}\n",
                index + 1,
                descriptor.syntax,
                descriptor.kind
            ));
        }
        out.push('\n');
    }
    Ok(out)
}
