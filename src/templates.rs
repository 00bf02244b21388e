//! Fixed syzlang text fragments

/// Preamble placed once at the top of every specification unit
pub const SYZ_PREAMBLE: &str = "include <net/socket.h>";

/// Render a struct definition block
///
/// `fields` are already formatted as `\tname\ttype` lines.
pub fn struct_block(struct_name: &str, fields: &[String]) -> String {
    format!("{} {{\n{}\n}}", struct_name, fields.join("\n"))
}

/// Render a single field line
pub fn field_line(field_name: &str, syz_type: &str) -> String {
    format!("\t{}\t{}", field_name, syz_type)
}

/// Render a syscall description line
pub fn syscall_line(syscall_name: &str, args: &str) -> String {
    format!("{}({})", syscall_name, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_block_layout() {
        let block = struct_block("udphdr", &[field_line("source", "int16")]);
        assert_eq!(block, "udphdr {\n\tsource\tint16\n}");
    }

    #[test]
    fn test_syscall_line() {
        assert_eq!(syscall_line("sendmsg$x", "fd sock"), "sendmsg$x(fd sock)");
    }
}
