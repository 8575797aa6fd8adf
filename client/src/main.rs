use std::{
    io::{self, BufRead, BufReader, Read, Write},
    os::unix::net::UnixStream,
    process,
};

use {
    anyhow::{bail, Context, Result},
    regex::Regex,
    structopt::{clap::AppSettings, StructOpt},
};

use common::{decode_hook, read_reply, socket_path, Request, RequestDecoder};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "arborc",
    about = "Send a command to the arbor window manager",
    setting = AppSettings::TrailingVarArg,
    setting = AppSettings::AllowLeadingHyphen
)]
struct Opt {
    /// Do not add a newline if the output does not end with one
    #[structopt(short = "n", long)]
    no_newline: bool,
    /// Do not print anything, only report the exit status
    #[structopt(short, long)]
    quiet: bool,
    /// Print hooks as they are emitted instead of running a command.
    /// The first argument, if any, is a regex the hook name has to match
    #[structopt(short, long)]
    idle: bool,
    /// Like --idle, but exit after --count matching hooks
    #[structopt(short, long)]
    wait: bool,
    /// How many hooks --wait waits for
    #[structopt(short, long, default_value = "1")]
    count: usize,
    /// Only print the last argument of each hook
    #[structopt(short, long)]
    last_arg: bool,
    /// Read encoded commands from stdin and write the raw replies to stdout
    #[structopt(short, long)]
    binary_pipe: bool,
    /// The command to run, or the hook filter with --idle and --wait
    args: Vec<String>,
}

fn connect() -> Result<UnixStream> {
    let path = socket_path();
    UnixStream::connect(&path)
        .with_context(|| format!("Could not connect to the window manager at {:?}", path))
}

fn call(opts: &Opt) -> Result<i32> {
    if opts.args.is_empty() {
        bail!("No command given");
    }
    let mut stream = connect()?;
    stream
        .write_all(&Request::Call(opts.args.clone()).encode())
        .context("Error sending the command")?;
    let reply = read_reply(&mut stream).context("Wrong response format")?;

    if !opts.quiet {
        let mut stdout = io::stdout();
        stdout.write_all(reply.stdout.as_bytes())?;
        if !opts.no_newline && !reply.stdout.is_empty() && !reply.stdout.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        io::stderr().write_all(reply.stderr.as_bytes())?;
    }
    Ok(reply.status)
}

fn idle(opts: &Opt) -> Result<i32> {
    let filter = match opts.args.first() {
        Some(re) => Some(Regex::new(&format!("^(?:{})$", re)).context("Invalid hook filter")?),
        None => None,
    };
    let mut stream = connect()?;
    stream
        .write_all(&Request::Idle.encode())
        .context("Error subscribing to hooks")?;

    let mut remaining = opts.count;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let hook = decode_hook(&line.context("Lost the connection to the window manager")?);
        let name = hook.first().map(String::as_str).unwrap_or_default();
        if let Some(filter) = &filter {
            if !filter.is_match(name) {
                continue;
            }
        }
        if !opts.quiet {
            if opts.last_arg {
                println!("{}", hook.last().map(String::as_str).unwrap_or_default());
            } else {
                println!("{}", hook.join("\t"));
            }
        }
        if opts.wait {
            remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                break;
            }
        }
    }
    Ok(0)
}

fn binary_pipe() -> Result<i32> {
    let mut stream = connect()?;
    let mut decoder = RequestDecoder::new();
    let mut stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut chunk = [0; 4096];
    loop {
        let read = stdin.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        decoder.feed(&chunk[..read]);
        while let Some(request) = decoder.next_request()? {
            if let Request::Idle = request {
                bail!("Idling is not possible in a binary pipe");
            }
            stream.write_all(&request.encode())?;
            let reply = read_reply(&mut stream).context("Wrong response format")?;
            stdout.write_all(&reply.encode())?;
            stdout.flush()?;
        }
    }
    if decoder.has_partial() {
        bail!("Incomplete command at the end of the input");
    }
    Ok(0)
}

fn main() -> Result<()> {
    let opts = Opt::from_args();
    let status = if opts.binary_pipe {
        binary_pipe()?
    } else if opts.idle || opts.wait {
        idle(&opts)?
    } else {
        call(&opts)?
    };
    process::exit(status);
}
