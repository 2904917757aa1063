//! Scrubbing of deployment secrets from `bluesky-aws` configs.

use serde_json::Value;

/// Replacement for every redacted value.
pub const REDACTED: &str = "(removed)";

/// Scalar fields replaced when present, as JSON pointers.
const SENSITIVE_FIELDS: &[&str] = &[
    "/aws/iam_instance_profile/Arn",
    "/aws/iam_instance_profile/Name",
    "/ssh_key",
    "/aws/ec2/key_pair_name",
    "/notifications/email/username",
    "/notifications/email/password",
];

/// Replace credentials and account identifiers in a bluesky-aws config.
///
/// Covers the IAM instance profile, SSH key, EC2 key pair, email
/// credentials, every security group id, and the file system id of every
/// EFS mount. All other values are left untouched. Returns the number of
/// values replaced.
pub fn redact_aws_config(config: &mut Value) -> usize {
    let mut replaced = 0;

    for pointer in SENSITIVE_FIELDS {
        if let Some(value) = config.pointer_mut(pointer) {
            if !value.is_null() {
                *value = Value::from(REDACTED);
                replaced += 1;
            }
        }
    }

    if let Some(Value::Array(groups)) = config.pointer_mut("/aws/ec2/security_groups") {
        for group in groups.iter_mut() {
            *group = Value::from(REDACTED);
            replaced += 1;
        }
    }

    // Each EFS volume is a [file_system_id, mount_point] pair.
    if let Some(Value::Array(volumes)) = config.pointer_mut("/aws/ec2/efs_volumes") {
        for volume in volumes.iter_mut() {
            if let Some(fs_id) = volume.as_array_mut().and_then(|v| v.first_mut()) {
                *fs_id = Value::from(REDACTED);
                replaced += 1;
            }
        }
    }

    replaced
}
