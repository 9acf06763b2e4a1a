//! # Terminal Commands
//!
//! Every stdin line is either a `/command` or raw scanner input.
//!
//! ```text
//!   /search cola      ──► Command::Search      (runs now)
//!   /find cola        ──► Command::Find        (debounced, like typing)
//!   /f3               ──► Command::Shortcut    (F3, submit checkout)
//!   6221031490019     ──► Input::Keystrokes    (fed to the scanner detector)
//! ```

use thiserror::Error;

use dukan_core::validation::parse_quantity;
use dukan_core::{PaymentMethod, ProductId, Shortcut, ValidationError};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Find(String),
    /// Adds the n-th product (1-based) of the last result list.
    Add(usize),
    Quantity { product_id: ProductId, quantity: i64 },
    Remove(ProductId),
    Discount(String),
    Name(String),
    Phone(String),
    Pay(PaymentMethod),
    Checkout,
    Clear,
    Scan,
    CancelScan,
    Cart,
    Shortcut { shortcut: Shortcut, confirmed: bool },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Empty,
    Command(Command),
    /// Characters to type into the scanner detector, followed by Enter.
    Keystrokes(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command /{0}. Type /help for a list.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

pub const HELP: &str = "\
Commands:
  /search <text>      search products now
  /find <text>        search after the input goes quiet
  /add <n>            add result n to the cart
  /qty <id> <n>       set quantity (0 removes)
  /rm <id>            remove a product
  /discount <amount>  set the discount
  /name <text>        customer name
  /phone <text>       customer phone
  /pay cash|card      payment method
  /checkout           submit the sale
  /clear              empty the cart
  /scan               open the barcode scanner
  /cancel             close the scanner
  /cart               show the cart
  /f1 .. /f4 [yes]    keyboard shortcuts (/f4 yes clears the cart)
  /quit
Any other line is treated as scanner input.";

/// Parses one line of terminal input.
pub fn parse_line(line: &str) -> Result<Input, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Input::Keystrokes(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "search" | "s" => Command::Search(required(args, "/search <text>")?),
        "find" => Command::Find(args.to_string()),
        "add" | "a" => Command::Add(index(args)?),
        "qty" | "q" => {
            let (id, quantity) = args
                .split_once(char::is_whitespace)
                .ok_or(CommandError::Usage("/qty <id> <n>"))?;
            Command::Quantity {
                product_id: product_id(id)?,
                quantity: parse_quantity(quantity)?,
            }
        }
        "rm" | "remove" => Command::Remove(product_id(args)?),
        "discount" | "d" => Command::Discount(args.to_string()),
        "name" => Command::Name(args.to_string()),
        "phone" => Command::Phone(args.to_string()),
        "pay" => Command::Pay(args.parse()?),
        "checkout" => Command::Checkout,
        "clear" => Command::Clear,
        "scan" => Command::Scan,
        "cancel" => Command::CancelScan,
        "cart" => Command::Cart,
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => match Shortcut::from_key(other) {
            Some(shortcut) => Command::Shortcut {
                shortcut,
                confirmed: args.eq_ignore_ascii_case("yes") || args.eq_ignore_ascii_case("y"),
            },
            None => return Err(CommandError::Unknown(other.to_string())),
        },
    };

    Ok(Input::Command(command))
}

fn required(args: &str, usage: &'static str) -> Result<String, CommandError> {
    if args.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(args.to_string())
    }
}

fn index(args: &str) -> Result<usize, CommandError> {
    match args.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::Usage("/add <n>, where n is a result number")),
    }
}

fn product_id(args: &str) -> Result<ProductId, CommandError> {
    args.trim()
        .parse::<ProductId>()
        .map_err(|_| CommandError::Usage("product ids are whole numbers"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse_line(line).unwrap() {
            Input::Command(command) => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_lines_are_keystrokes() {
        assert_eq!(parse_line("  ").unwrap(), Input::Empty);
        assert_eq!(
            parse_line(" 6221031490019 ").unwrap(),
            Input::Keystrokes("6221031490019".to_string())
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(command("/search cola 330"), Command::Search("cola 330".into()));
        assert_eq!(command("/find"), Command::Find(String::new()));
        assert_eq!(command("/add 2"), Command::Add(2));
        assert_eq!(
            command("/qty 7 0"),
            Command::Quantity {
                product_id: 7,
                quantity: 0
            }
        );
        assert_eq!(command("/rm 7"), Command::Remove(7));
        assert_eq!(command("/pay card"), Command::Pay(PaymentMethod::Card));
        assert_eq!(command("/CHECKOUT"), Command::Checkout);
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(
            command("/f3"),
            Command::Shortcut {
                shortcut: Shortcut::SubmitCheckout,
                confirmed: false
            }
        );
        assert_eq!(
            command("/F4 yes"),
            Command::Shortcut {
                shortcut: Shortcut::ClearCart,
                confirmed: true
            }
        );
    }

    #[test]
    fn test_bad_input() {
        assert_eq!(
            parse_line("/bogus"),
            Err(CommandError::Unknown("bogus".into()))
        );
        assert!(matches!(parse_line("/search"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_line("/add 0"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_line("/qty 7"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_line("/qty 7 2.5"), Err(CommandError::Invalid(_))));
        assert!(matches!(parse_line("/pay bitcoin"), Err(CommandError::Invalid(_))));
    }
}
