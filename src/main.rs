// SPDX: CC0-1.0

use anyhow::Context;
use cartesian_plane::{
    equation::{Equation, Slot, ValidationErr},
    plot::PlotMode,
    shell::{self, Command},
};
use chrono::{DateTime, Local};
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::ExitCode,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn output_data_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "data"
    )
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| concat!(env!("CARGO_CRATE_NAME"), "=warn").into()),
        )
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let mut eq = Equation::new();

    let mut stdout = BufWriter::new(stdout());
    loop {
        writeln!(stdout, "{}", shell::summary(&eq))?;

        let Some(mut try_cmd) = shell::input_line(&mut stdout, "> ")? else {
            // end of input
            writeln!(stdout)?;
            break;
        };
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::Show => shell::show(&mut stdout, &eq)?,

                Command::SetExpr(slot) => set_expr(&mut stdout, &mut eq, slot)?,

                Command::Var => set_var(&mut stdout, &mut eq)?,

                Command::Unset => unset_var(&mut stdout, &mut eq)?,

                Command::Range => set_range(&mut stdout, &mut eq)?,

                Command::Names => set_names(&mut stdout, &mut eq)?,

                Command::Mode => {
                    if let Ok(Some(mode)) = shell::read_fromstr::<_, PlotMode>(
                        &mut stdout,
                        format_args!("?mode (is {cur}) = ", cur = eq.plot_mode()),
                        true,
                    )? {
                        eq.set_plot_mode(mode);
                    }
                }

                Command::Plot => print_plot(&mut stdout, &mut eq)?,

                Command::Export => export_plot(&mut stdout, &mut eq)?,

                Command::Eval => {
                    let input = shell::input(&mut stdout, "? ")?;
                    if !input.is_empty() {
                        match eq.try_evaluate(&input) {
                            Ok(val) => writeln!(stdout, "{val}")?,
                            Err(err) => shell::print_messages(&mut stdout, &err.messages)?,
                        }
                    }
                }

                Command::PrintProg => {
                    if let Ok(Some(slot)) = shell::read_fromstr::<_, Slot>(
                        &mut stdout,
                        "?expression (x, y, r, t) = ",
                        true,
                    )? {
                        shell::dump_program(
                            &mut stdout,
                            eq.expr(slot).program(),
                            format_args!("{slot} program"),
                        )?;
                    }
                }
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn set_expr<W: Write>(mut out: W, eq: &mut Equation, slot: Slot) -> anyhow::Result<()> {
    let input = shell::input(&mut out, format_args!("{slot} = "))?;
    if input.is_empty() {
        return Ok(());
    }
    if let Err(err) = eq.set_expression(slot, &input) {
        shell::print_messages(&mut out, &err.messages)?;
    }
    Ok(())
}

fn set_var<W: Write>(mut out: W, eq: &mut Equation) -> anyhow::Result<()> {
    let name = shell::input(&mut out, "name = ")?;
    if name.is_empty() {
        return Ok(());
    }
    if !eq.is_valid_name(&name) {
        writeln!(
            out,
            "error: '{name}' is not a valid name (use letters, digits and '_', not starting with a digit)"
        )?;
        return Ok(());
    }

    let cur = eq.var(&name).unwrap_or(0.0);
    let input = shell::input(&mut out, format_args!("{name} (is {cur}) = "))?;
    let value = if input.is_empty() {
        cur
    } else {
        match eq.try_evaluate(&input) {
            Ok(val) => val,
            Err(err) => {
                shell::print_messages(&mut out, &err.messages)?;
                return Ok(());
            }
        }
    };
    eq.set_var(&name, value);
    Ok(())
}

fn unset_var<W: Write>(mut out: W, eq: &mut Equation) -> anyhow::Result<()> {
    let name = shell::input(&mut out, "name = ")?;
    if name.is_empty() {
        return Ok(());
    }
    if eq.remove_var(&name).is_none() {
        writeln!(out, "error: variable '{name}' is not declared")?;
    }
    Ok(())
}

fn set_range<W: Write>(mut out: W, eq: &mut Equation) -> anyhow::Result<()> {
    type Getter = fn(&Equation) -> &str;
    type Setter = fn(&mut Equation, &str) -> Result<(), ValidationErr>;

    writeln!(out, "range = {}", eq.range())?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let fields: [(&str, Getter, Setter); 3] = [
        ("start", Equation::range_start_expr, Equation::set_range_start),
        ("end", Equation::range_end_expr, Equation::set_range_end),
        ("step", Equation::range_step_expr, Equation::set_range_step),
    ];
    for (name, get, set) in fields {
        let input = shell::input(&mut out, format_args!("?{name} (is {cur}) = ", cur = get(eq)))?;
        if input.is_empty() {
            continue;
        }
        if let Err(err) = set(eq, &input) {
            shell::print_messages(&mut out, &err.messages)?;
            return Ok(());
        }
    }

    Ok(())
}

fn set_names<W: Write>(mut out: W, eq: &mut Equation) -> anyhow::Result<()> {
    type Getter = fn(&Equation) -> &str;
    type Setter = fn(&mut Equation, String);

    writeln!(out, "note: leave blank to skip")?;
    let fields: [(&str, Getter, Setter); 3] = [
        ("param", Equation::param_name, |eq, name| {
            eq.set_param_name(name)
        }),
        ("radius", Equation::radius_name, |eq, name| {
            eq.set_radius_name(name)
        }),
        ("theta", Equation::theta_name, |eq, name| {
            eq.set_theta_name(name)
        }),
    ];
    for (what, get, set) in fields {
        let input = shell::input(&mut out, format_args!("?{what} (is {cur}) = ", cur = get(eq)))?;
        if input.is_empty() {
            continue;
        }
        if !eq.is_valid_name(&input) {
            writeln!(out, "error: '{input}' is not a valid name")?;
            return Ok(());
        }
        if eq.var(&input).is_none() {
            writeln!(out, "note: '{input}' is not declared yet, use 'var' to declare it")?;
        }
        set(eq, input);
    }

    Ok(())
}

fn print_plot<W: Write>(mut out: W, eq: &mut Equation) -> anyhow::Result<()> {
    let precision = usize::from(eq.precision());
    match eq.plot() {
        Ok(points) => {
            for point in points {
                writeln!(out, "  {point:.precision$}")?;
            }
        }
        Err(err) => writeln!(out, "plot error: {err}")?,
    }
    Ok(())
}

fn export_plot<W: Write>(mut out: W, eq: &mut Equation) -> anyhow::Result<()> {
    let points = match eq.plot() {
        Ok(points) => points,
        Err(err) => {
            writeln!(out, "plot error: {err}")?;
            return Ok(());
        }
    };

    let data_path = output_data_filename(Local::now());
    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );

    writeln!(data, "# {}", shell::summary(eq)).context("failed to write to output data file")?;
    let mut count = 0usize;
    for point in points {
        writeln!(data, "{x} {y}", x = point.x, y = point.y)
            .context("failed to write to output data file")?;
        count += 1;
    }
    data.flush()?;
    data.get_mut().sync_data()?;
    drop(data);

    info!(path = %data_path, count, "exported plot");
    writeln!(out, "wrote {count} points to {data_path}")?;
    Ok(())
}
