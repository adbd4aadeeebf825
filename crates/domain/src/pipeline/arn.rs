use std::str::FromStr;

use crate::errors::Error;

/// `arn:partition:service:region:account:resource`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource: String,
}

impl FromStr for Arn {
    type Err = Error;

    fn from_str(arn: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidArn {
            arn: arn.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" {
            return Err(invalid("expected arn:partition:service:region:account:resource"));
        }
        if parts[1].is_empty() || parts[2].is_empty() || parts[5].is_empty() {
            return Err(invalid("partition, service and resource are required"));
        }

        Ok(Arn {
            partition: parts[1].to_string(),
            service: parts[2].to_string(),
            region: parts[3].to_string(),
            account: parts[4].to_string(),
            resource: parts[5].to_string(),
        })
    }
}

impl Arn {
    fn invalid(&self, reason: String) -> Error {
        Error::InvalidArn {
            arn: format!(
                "arn:{}:{}:{}:{}:{}",
                self.partition, self.service, self.region, self.account, self.resource
            ),
            reason,
        }
    }
}

/// Name of the catalog database referenced by a `glue` database ARN.
pub fn database_name(arn: &str) -> Result<String, Error> {
    let parsed: Arn = arn.parse()?;
    if parsed.service != "glue" {
        return Err(parsed.invalid(format!("expected a glue ARN, found {}", parsed.service)));
    }

    match parsed.resource.split_once('/') {
        Some(("database", name)) if !name.is_empty() && !name.contains('/') => Ok(name.to_string()),
        _ => Err(parsed.invalid("expected a database/<name> resource".to_string())),
    }
}

/// Name of the bucket referenced by an `s3` bucket ARN.
pub fn bucket_name(arn: &str) -> Result<String, Error> {
    let parsed: Arn = arn.parse()?;
    if parsed.service != "s3" {
        return Err(parsed.invalid(format!("expected an s3 ARN, found {}", parsed.service)));
    }
    if parsed.resource.contains('/') {
        return Err(parsed.invalid("expected a bucket, not an object".to_string()));
    }
    Ok(parsed.resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_database_name() {
        assert_eq!(
            database_name("arn:aws:glue:eu-west-1:123456789012:database/twitter").unwrap(),
            "twitter"
        );
    }

    #[test]
    fn extracts_bucket_name() {
        assert_eq!(bucket_name("arn:aws:s3:::tweets-raw").unwrap(), "tweets-raw");
    }

    #[test]
    fn rejects_malformed_references() {
        assert!(database_name("aws:::glue:database").is_err());
        assert!(database_name("arn:aws:glue:eu-west-1:123456789012:table/twitter/t").is_err());
        assert!(database_name("arn:aws:s3:::twitter").is_err());
        assert!(bucket_name("arn:aws:s3:::bucket/key").is_err());
        assert!(bucket_name("arn:::s3:bucket").is_err());
    }
}
