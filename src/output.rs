use crate::model::{OutputConfig, OutputFormat, ProbeResult};
use std::io::{BufWriter, Write};

pub struct OutputWriter<W: Write> {
    cfg: OutputConfig,
    writer: BufWriter<W>,
}

impl OutputWriter<std::io::Stdout> {
    pub fn stdout(cfg: OutputConfig) -> Self {
        Self::new(cfg, std::io::stdout())
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(cfg: OutputConfig, writer: W) -> Self {
        Self {
            cfg,
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_result(&mut self, result: &ProbeResult) -> anyhow::Result<()> {
        match self.cfg.format {
            OutputFormat::Json => {
                let text = serde_json::to_string_pretty(result)?;
                writeln!(self.writer, "{text}")?;
            }
            OutputFormat::Pretty => self.write_summary(result)?,
        }

        self.writer.flush()?;
        Ok(())
    }

    fn write_summary(&mut self, result: &ProbeResult) -> std::io::Result<()> {
        let proxy = result.proxy_view();
        match result {
            ProbeResult::Proxy(ok) => {
                let data = &ok.data;
                writeln!(
                    self.writer,
                    "{}:{} -> proxy ({} ms)",
                    proxy.address, proxy.port, ok.response_time_ms
                )?;
                writeln!(self.writer, "  client ip: {}", data.client_ip)?;
                writeln!(
                    self.writer,
                    "  network:   AS{} {} via {}",
                    data.asn, data.as_organization, data.colo
                )?;
                writeln!(
                    self.writer,
                    "  location:  {} {}, {}, {}",
                    data.country_flag, data.city, data.region, data.country_name
                )?;
            }
            ProbeResult::Failed(failed) => {
                writeln!(
                    self.writer,
                    "{}:{} -> not a proxy [{}] {}",
                    proxy.address, proxy.port, failed.stage, failed.message
                )?;
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to flush output: {}", err.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::model::ProbeTarget;

    fn render(format: OutputFormat, result: &ProbeResult) -> String {
        let mut out = OutputWriter::new(OutputConfig { format }, Vec::new());
        out.write_result(result).unwrap();
        String::from_utf8(out.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn json_output_is_parseable() {
        let result = ProbeResult::failed(
            &ProbeTarget::new("198.51.100.4", 443),
            &ProbeError::Timeout {
                stage: crate::model::Stage::Connect,
            },
        );
        let text = render(OutputFormat::Json, &result);
        let back: ProbeResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn pretty_output_names_the_stage() {
        let result = ProbeResult::failed(
            &ProbeTarget::new("198.51.100.4", 443),
            &ProbeError::MissingClientIp,
        );
        let text = render(OutputFormat::Pretty, &result);
        assert_eq!(
            text,
            "198.51.100.4:443 -> not a proxy [parse] Invalid JSON response\n"
        );
    }
}
