//! Handler for `artiflow tree`.

use miette::Result;

use artiflow_ops::ops_tree::{self, TreeOptions};

use crate::cli::TreeInputArgs;

pub fn exec(
    input: TreeInputArgs,
    depth: Option<usize>,
    json: bool,
    flat: bool,
    direct: bool,
) -> Result<()> {
    let inputs = super::tree_inputs(input)?;
    let opts = TreeOptions {
        depth,
        json,
        flat,
        direct,
    };
    ops_tree::tree(&inputs, &opts)
}
