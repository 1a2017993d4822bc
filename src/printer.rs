// ABOUTME: Textual dump of compiled code as numbered blocks

use crate::inst::{Code, Inst};

/// Renders code as numbered blocks: `[0 entry]` first, then one block per
/// nested `ldf`/`ldm`/`sel` body in the order they are encountered.
pub fn print_code(code: &Code) -> String {
    let mut printer = CodePrinter::default();
    printer.put_block("entry", code);
    printer.blocks.concat()
}

#[derive(Default)]
struct CodePrinter {
    id: usize,
    blocks: Vec<String>,
}

impl CodePrinter {
    fn put_block(&mut self, header: &str, code: &Code) -> String {
        let id = format!("[{} {}]", self.id, header);
        self.id += 1;

        // Reserve this block's slot before descending so nested blocks keep
        // higher numbers but appear after it.
        let slot = self.blocks.len();
        self.blocks.push(String::new());

        let mut block = format!("{}\n", id);
        for inst in code.iter() {
            let line = self.put_inst(inst);
            block.push_str("  ");
            block.push_str(&line);
            block.push('\n');
        }
        self.blocks[slot] = block;
        id
    }

    fn put_inst(&mut self, inst: &Inst) -> String {
        match inst {
            Inst::Ldc(value) => format!("ldc {}", value),
            Inst::Ldv(name) => format!("ldv {}", name),
            Inst::Ldf(pattern, code) => {
                let block = self.put_block(&format!("fun {}", pattern), code);
                format!("ldf {}", block)
            }
            Inst::Ldm(pattern, code) => {
                let block = self.put_block(&format!("macro {}", pattern), code);
                format!("ldm {}", block)
            }
            Inst::Ldb(name) => format!("ldb {}", name),
            Inst::Sel(a, b) => {
                let then_block = self.put_block("then", a);
                let else_block = self.put_block("else", b);
                format!("sel {} {}", then_block, else_block)
            }
            Inst::App(argc) => format!("app {}", argc),
            Inst::Leave => "leave".to_string(),
            Inst::Pop => "pop".to_string(),
            Inst::Def(name) => format!("def {}", name),
            Inst::Set(name) => format!("set {}", name),
        }
    }
}
